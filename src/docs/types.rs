use serde::{Deserialize, Serialize};

/// Backend-assigned document identifier.
pub type DocId = String;

/// One ingested document as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: DocId,
    pub filename: String,
    pub num_chunks: u64,
    /// ISO timestamp; older backends omit it.
    #[serde(default)]
    pub upload_time: Option<String>,
}

/// Response body of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub doc_id: DocId,
    pub filename: String,
    pub num_chunks: u64,
    #[serde(default)]
    pub total_chunks_in_store: Option<u64>,
}

/// Acknowledgement for a delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub chunks_removed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Error,
}

/// Terminal status of the last upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub kind: OutcomeKind,
    pub message: String,
}

impl UploadOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}

/// Coarse document type, derived from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Pdf,
    Word,
    Text,
}

impl DocKind {
    pub fn of(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            DocKind::Pdf
        } else if lower.ends_with(".docx") {
            DocKind::Word
        } else {
            DocKind::Text
        }
    }
}
