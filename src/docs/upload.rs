use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::backend::Backend;

use super::types::UploadOutcome;

/// Extensions the backend can ingest, lowercase, with the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".txt", ".docx"];

/// A file offered for upload. Content is read only after validation passes.
#[async_trait]
pub trait SourceFile: Send + Sync {
    fn filename(&self) -> &str;

    async fn read(&self) -> Result<Vec<u8>>;
}

/// A file already held in memory.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
impl SourceFile for LocalFile {
    fn filename(&self) -> &str {
        &self.filename
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Lowercased extension of `filename` including the dot, `None` without one.
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rfind('.')
        .map(|pos| filename[pos..].to_lowercase())
}

/// Check `filename` against [`ALLOWED_EXTENSIONS`]. The error is the user-facing reason.
pub fn validate(filename: &str) -> Result<(), String> {
    match extension(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(format!("Unsupported file type: {}", ext)),
        None => Err("Unsupported file type: (none)".to_string()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct UploadState {
    pub uploading: bool,
    pub outcome: Option<UploadOutcome>,
}

/// Validates candidate files and drives one upload at a time.
pub struct UploadPipeline {
    backend: Arc<dyn Backend>,
    refresh: watch::Sender<u64>,
    state: Mutex<UploadState>,
}

impl UploadPipeline {
    /// `refresh` is bumped after every successful upload.
    pub fn new(backend: Arc<dyn Backend>, refresh: watch::Sender<u64>) -> Self {
        Self {
            backend,
            refresh,
            state: Mutex::new(UploadState::default()),
        }
    }

    /// Dropped files: only the first is processed.
    pub async fn handle_drop<F: SourceFile>(&self, files: &[F]) -> Option<UploadOutcome> {
        if files.len() > 1 {
            debug!(dropped = files.len(), "processing first dropped file only");
        }
        let first = files.first()?;
        self.handle_file(first).await
    }

    /// Validate then upload one file.
    ///
    /// `None` means the pipeline was busy and the file was not looked at.
    pub async fn handle_file<F: SourceFile + ?Sized>(&self, file: &F) -> Option<UploadOutcome> {
        let filename = file.filename().to_string();
        {
            let mut state = self.state.lock().await;
            if state.uploading {
                return None;
            }

            if let Err(reason) = validate(&filename) {
                info!(filename, reason, "upload rejected");
                let outcome = UploadOutcome::error(reason);
                state.outcome = Some(outcome.clone());
                return Some(outcome);
            }

            state.uploading = true;
            state.outcome = None;
        }

        let outcome = self.upload(file, &filename).await;

        let mut state = self.state.lock().await;
        state.uploading = false;
        state.outcome = Some(outcome.clone());
        Some(outcome)
    }

    async fn upload<F: SourceFile + ?Sized>(&self, file: &F, filename: &str) -> UploadOutcome {
        let bytes = match file.read().await {
            Ok(bytes) => bytes,
            Err(e) => return UploadOutcome::error(format!("{:#}", e)),
        };
        info!(filename, size = bytes.len(), "upload started");

        match self.backend.upload(filename, bytes).await {
            Ok(doc) => {
                info!(
                    doc_id = %doc.doc_id,
                    num_chunks = doc.num_chunks,
                    total_chunks = ?doc.total_chunks_in_store,
                    "upload complete"
                );
                self.refresh.send_modify(|generation| *generation += 1);
                UploadOutcome::success(format!(
                    "\"{}\" uploaded — {} chunks created",
                    doc.filename, doc.num_chunks
                ))
            }
            Err(e) => UploadOutcome::error(e.to_string()),
        }
    }

    pub async fn state(&self) -> UploadState {
        self.state.lock().await.clone()
    }
}
