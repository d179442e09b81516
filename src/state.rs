use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};

use crate::backend::Backend;
use crate::chat::Conversation;
use crate::docs::upload::UploadPipeline;
use crate::docs::DocumentRegistry;
use crate::health::HealthSnapshot;

/// Query parameters admins can change at runtime.
#[derive(Debug, Default)]
pub struct QueryConfig {
    /// Sent as `top_k` when set; otherwise the backend default applies.
    pub top_k: Option<u32>,
}

impl QueryConfig {
    pub fn from_env() -> Self {
        let top_k = dotenv::var("DOCENT_TOP_K")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|k| *k > 0);
        Self { top_k }
    }
}

/// One conversation per Discord channel, created on first use.
pub struct Conversations {
    backend: Arc<dyn Backend>,
    by_channel: Mutex<HashMap<u64, Arc<Conversation>>>,
}

impl Conversations {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            by_channel: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, channel_id: u64) -> Arc<Conversation> {
        self.by_channel
            .lock()
            .await
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Conversation::with_greeting(self.backend.clone())))
            .clone()
    }
}

pub struct AppState {
    pub uploads: Arc<UploadPipeline>,
    pub registry: Arc<DocumentRegistry>,
    pub health: watch::Receiver<Option<HealthSnapshot>>,
    pub conversations: Conversations,
    pub admin_ids: HashSet<u64>,
    pub query_config: Arc<RwLock<QueryConfig>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
