pub mod turn;

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::backend::Backend;

pub use turn::{ChatTurn, Role, TurnId, NO_ANSWER};

pub const GREETING: &str = "Hello! I answer questions about the documents in this server's library. \
Upload some with `/docent upload` (or mention me with a file attached), then ask away.";

/// A question that has been accepted and is waiting for its answer.
///
/// Produced by [`Conversation::begin`]; hand it back to
/// [`Conversation::complete`] or the conversation stays busy.
#[must_use = "a pending question keeps the conversation busy until completed"]
#[derive(Debug)]
pub struct PendingQuestion {
    pub question: String,
    pub user_turn: ChatTurn,
    pub placeholder: ChatTurn,
}

#[derive(Default)]
struct Transcript {
    /// Insertion order is display order; entries are only ever replaced in place.
    turns: IndexMap<TurnId, ChatTurn>,
    busy: bool,
    next_id: u64,
}

impl Transcript {
    fn allocate(&mut self) -> TurnId {
        self.next_id += 1;
        TurnId(self.next_id)
    }

    fn push(&mut self, turn: ChatTurn) {
        self.turns.insert(turn.id, turn);
    }
}

/// Conversation engine: ordered chat turns plus the submit-question protocol.
///
/// At most one question is in flight. The assistant's answer lands in the
/// placeholder that was appended when the question was accepted, keyed by id,
/// so turns never move.
pub struct Conversation {
    backend: Arc<dyn Backend>,
    transcript: Mutex<Transcript>,
}

impl Conversation {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            transcript: Mutex::new(Transcript::default()),
        }
    }

    /// A conversation that opens with the assistant's greeting.
    pub fn with_greeting(backend: Arc<dyn Backend>) -> Self {
        let mut transcript = Transcript::default();
        let id = transcript.allocate();
        transcript.push(ChatTurn::assistant(id, GREETING));
        Self {
            backend,
            transcript: Mutex::new(transcript),
        }
    }

    /// Accept `question`: append the user turn and its pending placeholder.
    ///
    /// Returns `None`, changing nothing, when the question is blank or another
    /// question is still in flight.
    pub async fn begin(&self, question: &str) -> Option<PendingQuestion> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let mut transcript = self.transcript.lock().await;
        if transcript.busy {
            return None;
        }

        let user_id = transcript.allocate();
        let user_turn = ChatTurn::user(user_id, question);
        transcript.push(user_turn.clone());

        let placeholder_id = transcript.allocate();
        let placeholder = ChatTurn::placeholder(placeholder_id);
        transcript.push(placeholder.clone());
        transcript.busy = true;

        Some(PendingQuestion {
            question: question.to_string(),
            user_turn,
            placeholder,
        })
    }

    /// Run the query for an accepted question and reconcile its placeholder.
    /// Returns the resolved turn; the conversation is idle again afterwards.
    pub async fn complete(&self, pending: PendingQuestion, top_k: Option<u32>) -> ChatTurn {
        let id = pending.placeholder.id;
        info!(%id, question = pending.question, ?top_k, "query started");

        let result = self.backend.query(&pending.question, top_k).await;

        let mut transcript = self.transcript.lock().await;
        transcript.busy = false;

        let Some(turn) = transcript.turns.get_mut(&id) else {
            // Turns are never removed; answer on the detached copy if one ever is.
            warn!(%id, "placeholder vanished before its answer arrived");
            let mut orphan = pending.placeholder;
            match result {
                Ok(answer) => orphan.resolve(answer.answer, answer.sources),
                Err(e) => orphan.fail(&e.to_string()),
            }
            return orphan;
        };

        match result {
            Ok(answer) => {
                info!(%id, sources = answer.sources.len(), "query answered");
                turn.resolve(answer.answer, answer.sources);
            }
            Err(e) => {
                warn!(%id, error = %e, "query failed");
                turn.fail(&e.to_string());
            }
        }
        turn.clone()
    }

    /// [`begin`](Self::begin) then [`complete`](Self::complete).
    pub async fn submit(&self, question: &str, top_k: Option<u32>) -> Option<ChatTurn> {
        let pending = self.begin(question).await?;
        Some(self.complete(pending, top_k).await)
    }

    pub async fn is_busy(&self) -> bool {
        self.transcript.lock().await.busy
    }

    /// Snapshot of all turns in display order.
    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.transcript.lock().await.turns.values().cloned().collect()
    }
}
