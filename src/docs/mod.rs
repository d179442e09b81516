pub mod types;
pub mod upload;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::prompt::Prompter;

use types::{DeleteAck, DocId, DocumentRecord};

/// What happened to a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The user said no; nothing was sent.
    Declined,
    /// A delete for this document is already pending.
    InFlight,
    Deleted(DeleteAck),
    Failed(String),
}

/// Point-in-time copy of the registry for display.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub documents: Vec<DocumentRecord>,
    /// True while any listing is outstanding.
    pub loading: bool,
    pub deleting: HashSet<DocId>,
}

#[derive(Default)]
struct RegistryState {
    documents: Vec<DocumentRecord>,
    deleting: HashSet<DocId>,
    /// Listings currently awaiting the backend.
    fetches_in_flight: usize,
    /// Generation handed to the most recently started listing.
    started: u64,
    /// Newest generation whose result may still be applied. Anything at or
    /// below it is stale.
    applied: u64,
}

/// Local view of the backend's document set.
///
/// Always holds either the last full listing, or that listing minus deletes
/// the backend has confirmed. Nothing is removed before confirmation.
pub struct DocumentRegistry {
    backend: Arc<dyn Backend>,
    state: Mutex<RegistryState>,
}

impl DocumentRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Re-list documents. A failed listing keeps the previous set and is only logged.
    ///
    /// Overlapping refreshes are allowed; a listing that finishes after a newer
    /// one was applied is dropped.
    pub async fn refresh(&self) {
        let generation = {
            let mut state = self.state.lock().await;
            state.fetches_in_flight += 1;
            state.started += 1;
            state.started
        };

        let result = self.backend.list_documents().await;

        let mut state = self.state.lock().await;
        state.fetches_in_flight -= 1;
        match result {
            Ok(documents) if generation > state.applied => {
                debug!(count = documents.len(), generation, "document list refreshed");
                state.documents = documents;
                state.applied = generation;
            }
            Ok(_) => debug!(generation, "stale document list dropped"),
            Err(e) => warn!(error = %e, "Failed to fetch documents"),
        }
    }

    /// Fetch once now, then again on every change of `refresh`.
    /// Ends when the sending side goes away.
    pub async fn follow(self: Arc<Self>, mut refresh: watch::Receiver<u64>) {
        self.refresh().await;
        while refresh.changed().await.is_ok() {
            self.refresh().await;
        }
        debug!("registry refresh signal closed");
    }

    /// Delete `doc_id` after the user confirms it by `filename`.
    pub async fn delete(
        &self,
        doc_id: &str,
        filename: &str,
        prompter: &dyn Prompter,
    ) -> DeleteOutcome {
        if self.is_deleting(doc_id).await {
            return DeleteOutcome::InFlight;
        }

        if !prompter.confirm(&format!("Delete \"{}\"?", filename)).await {
            return DeleteOutcome::Declined;
        }

        // Re-checked: another delete may have started while the user was deciding.
        if !self.state.lock().await.deleting.insert(doc_id.to_string()) {
            return DeleteOutcome::InFlight;
        }

        let result = self.backend.delete_document(doc_id).await;

        let outcome = {
            let mut state = self.state.lock().await;
            state.deleting.remove(doc_id);
            match result {
                Ok(ack) => {
                    state.documents.retain(|d| d.doc_id != doc_id);
                    // Listings started before the backend confirmed may still hold the record.
                    state.applied = state.started;
                    info!(doc_id, filename, "document deleted");
                    DeleteOutcome::Deleted(ack)
                }
                Err(e) => {
                    warn!(doc_id, error = %e, "delete failed");
                    DeleteOutcome::Failed(e.to_string())
                }
            }
        };

        if let DeleteOutcome::Failed(reason) = &outcome {
            prompter.notify(&format!("Delete failed: {}", reason)).await;
        }
        outcome
    }

    pub async fn is_deleting(&self, doc_id: &str) -> bool {
        self.state.lock().await.deleting.contains(doc_id)
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.lock().await;
        RegistrySnapshot {
            documents: state.documents.clone(),
            loading: state.fetches_in_flight > 0,
            deleting: state.deleting.clone(),
        }
    }

    pub async fn documents(&self) -> Vec<DocumentRecord> {
        self.state.lock().await.documents.clone()
    }
}
