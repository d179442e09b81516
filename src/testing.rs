//! Scripted in-memory backend for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::backend::{Backend, GatewayError, QueryAnswer};
use crate::docs::types::{DeleteAck, DocumentRecord, UploadedDocument};
use crate::health::HealthSnapshot;

pub struct FakeBackend {
    documents: Mutex<Vec<DocumentRecord>>,
    queries: Mutex<VecDeque<Result<QueryAnswer, GatewayError>>>,
    uploads: Mutex<VecDeque<Result<UploadedDocument, GatewayError>>>,
    deletes: Mutex<VecDeque<Result<DeleteAck, GatewayError>>>,
    list_error: Mutex<Option<GatewayError>>,
    health: Mutex<HealthSnapshot>,
    delete_gate: Mutex<Option<Arc<Notify>>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
    last_top_k: Mutex<Option<Option<u32>>>,
    query_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    probe_calls: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            queries: Mutex::new(VecDeque::new()),
            uploads: Mutex::new(VecDeque::new()),
            deletes: Mutex::new(VecDeque::new()),
            list_error: Mutex::new(None),
            health: Mutex::new(HealthSnapshot::reported(true, true, 0, 0)),
            delete_gate: Mutex::new(None),
            list_gate: Mutex::new(None),
            last_top_k: Mutex::new(None),
            query_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
        }
    }
}

pub fn record(doc_id: &str, filename: &str, num_chunks: u64) -> DocumentRecord {
    DocumentRecord {
        doc_id: doc_id.to_string(),
        filename: filename.to_string(),
        num_chunks,
        upload_time: None,
    }
}

impl FakeBackend {
    pub fn with_documents(documents: Vec<DocumentRecord>) -> Self {
        let backend = Self::default();
        *backend.documents.lock().unwrap() = documents;
        backend
    }

    pub fn push_query(&self, result: Result<QueryAnswer, GatewayError>) {
        self.queries.lock().unwrap().push_back(result);
    }

    pub fn push_upload(&self, result: Result<UploadedDocument, GatewayError>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_delete(&self, result: Result<DeleteAck, GatewayError>) {
        self.deletes.lock().unwrap().push_back(result);
    }

    pub fn fail_listing(&self, error: Option<GatewayError>) {
        *self.list_error.lock().unwrap() = error;
    }

    pub fn set_health(&self, snapshot: HealthSnapshot) {
        *self.health.lock().unwrap() = snapshot;
    }

    /// Hold every delete until the returned gate is notified.
    pub fn hold_deletes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.delete_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold the next listing until the returned gate is notified. The listing
    /// reflects the documents as they were when it was requested.
    pub fn hold_next_listing(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn last_top_k(&self) -> Option<Option<u32>> {
        *self.last_top_k.lock().unwrap()
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedDocument, GatewayError> {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.uploads.lock().unwrap().pop_front();
        let uploaded = scripted.unwrap_or_else(|| {
            Ok(UploadedDocument {
                doc_id: format!("doc-{}", n),
                filename: filename.to_string(),
                num_chunks: (bytes.len() as u64 / 100).max(1),
                total_chunks_in_store: None,
            })
        })?;

        self.documents.lock().unwrap().push(DocumentRecord {
            doc_id: uploaded.doc_id.clone(),
            filename: uploaded.filename.clone(),
            num_chunks: uploaded.num_chunks,
            upload_time: None,
        });
        Ok(uploaded)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        let documents = self.documents.lock().unwrap().clone();
        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(documents)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<DeleteAck, GatewayError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.delete_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self.deletes.lock().unwrap().pop_front();
        let ack = scripted.unwrap_or_else(|| Ok(DeleteAck::default()))?;
        self.documents.lock().unwrap().retain(|d| d.doc_id != doc_id);
        Ok(ack)
    }

    async fn query(
        &self,
        _question: &str,
        top_k: Option<u32>,
    ) -> Result<QueryAnswer, GatewayError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_top_k.lock().unwrap() = Some(top_k);
        let scripted = self.queries.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(QueryAnswer {
                answer: "ok".to_string(),
                sources: Vec::new(),
            })
        })
    }

    async fn probe_health(&self) -> HealthSnapshot {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let mut snapshot = self.health.lock().unwrap().clone();
        snapshot.checked_at = chrono::Utc::now();
        snapshot
    }
}
