use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::docs::types::{DeleteAck, DocumentRecord, UploadedDocument};
use crate::health::HealthSnapshot;

/// Failure of a single backend request. `Display` is the human reason only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Upload(String),
    #[error("{0}")]
    Fetch(String),
    #[error("{0}")]
    Delete(String),
    #[error("{0}")]
    Query(String),
}

/// A document fragment cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub filename: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    ollama: CollaboratorStatus,
    #[serde(default)]
    total_documents: u64,
    #[serde(default)]
    total_chunks: u64,
}

#[derive(Deserialize, Default)]
struct CollaboratorStatus {
    #[serde(default)]
    status: String,
}

/// The RAG backend as seen by the bot. Every call is a single attempt.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn upload(&self, filename: &str, bytes: Vec<u8>)
        -> Result<UploadedDocument, GatewayError>;

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, GatewayError>;

    async fn delete_document(&self, doc_id: &str) -> Result<DeleteAck, GatewayError>;

    async fn query(&self, question: &str, top_k: Option<u32>)
        -> Result<QueryAnswer, GatewayError>;

    /// Never fails: any problem is folded into a degraded snapshot.
    async fn probe_health(&self) -> HealthSnapshot;
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let base_url = dotenv::var("DOCENT_API_BASE")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());
        Self { base_url }
    }
}

/// JSON/HTTP implementation of [`Backend`].
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Pull the backend's `detail` out of an error body, falling back to `fallback`.
async fn failure_reason(resp: Response, fallback: &str) -> String {
    let status = resp.status();
    let detail = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("detail").and_then(|d| d.as_str()).map(str::to_string));

    warn!(%status, detail = detail.as_deref().unwrap_or(""), "backend request rejected");
    detail.unwrap_or_else(|| fallback.to_string())
}

fn transport(err: reqwest::Error) -> String {
    warn!(error = %err, "backend request failed");
    err.to_string()
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedDocument, GatewayError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.endpoint("/documents/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Upload(transport(e)))?;

        if !resp.status().is_success() {
            return Err(GatewayError::Upload(
                failure_reason(resp, "Upload failed").await,
            ));
        }

        resp.json()
            .await
            .map_err(|e| GatewayError::Upload(transport(e)))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, GatewayError> {
        let resp = self
            .client
            .get(self.endpoint("/documents/"))
            .send()
            .await
            .map_err(|e| GatewayError::Fetch(transport(e)))?;

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "document listing rejected");
            return Err(GatewayError::Fetch("Failed to fetch documents".to_string()));
        }

        resp.json()
            .await
            .map_err(|e| GatewayError::Fetch(transport(e)))
    }

    async fn delete_document(&self, doc_id: &str) -> Result<DeleteAck, GatewayError> {
        let resp = self
            .client
            .delete(self.endpoint(&format!("/documents/{}", doc_id)))
            .send()
            .await
            .map_err(|e| GatewayError::Delete(transport(e)))?;

        if !resp.status().is_success() {
            return Err(GatewayError::Delete(
                failure_reason(resp, "Delete failed").await,
            ));
        }

        // The ack body is informational; an unreadable one still means deleted.
        Ok(resp.json().await.unwrap_or_default())
    }

    async fn query(
        &self,
        question: &str,
        top_k: Option<u32>,
    ) -> Result<QueryAnswer, GatewayError> {
        let body = QueryRequest { question, top_k };

        let resp = self
            .client
            .post(self.endpoint("/query"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Query(transport(e)))?;

        if !resp.status().is_success() {
            return Err(GatewayError::Query(
                failure_reason(resp, "Query failed").await,
            ));
        }

        resp.json()
            .await
            .map_err(|e| GatewayError::Query(transport(e)))
    }

    async fn probe_health(&self) -> HealthSnapshot {
        let result: Result<HealthResponse> = async {
            let resp = self
                .client
                .get(self.endpoint("/health"))
                .send()
                .await
                .context("Health request failed")?;
            if !resp.status().is_success() {
                anyhow::bail!("Backend unreachable");
            }
            resp.json::<HealthResponse>()
                .await
                .context("Malformed health response")
        }
        .await;

        match result {
            Ok(health) => HealthSnapshot::reported(
                health.status == "ok",
                health.ollama.status == "connected",
                health.total_documents,
                health.total_chunks,
            ),
            Err(e) => {
                debug!(error = %e, "health probe failed");
                HealthSnapshot::unreachable(format!("{:#}", e))
            }
        }
    }
}
