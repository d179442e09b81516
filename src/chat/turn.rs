use std::fmt;

use crate::backend::Source;

/// Identity of a turn within one conversation. Allocated from a counter, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub id: TurnId,
    pub role: Role,
    /// Empty only while `pending`.
    pub content: String,
    /// True only for an assistant turn waiting on its answer.
    pub pending: bool,
    /// Present only on a resolved assistant turn that cites evidence.
    pub sources: Option<Vec<Source>>,
}

/// Shown when the backend answers with an empty string.
pub const NO_ANSWER: &str = "(no answer)";

impl ChatTurn {
    pub fn user(id: TurnId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            pending: false,
            sources: None,
        }
    }

    pub fn assistant(id: TurnId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            pending: false,
            sources: None,
        }
    }

    pub fn placeholder(id: TurnId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            pending: true,
            sources: None,
        }
    }

    pub fn resolve(&mut self, answer: String, sources: Vec<Source>) {
        self.content = if answer.trim().is_empty() {
            NO_ANSWER.to_string()
        } else {
            answer
        };
        self.sources = if sources.is_empty() {
            None
        } else {
            Some(sources)
        };
        self.pending = false;
    }

    pub fn fail(&mut self, message: &str) {
        self.content = format!("Error: {}", message);
        self.sources = None;
        self.pending = false;
    }
}
