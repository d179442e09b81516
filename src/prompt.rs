use async_trait::async_trait;

/// User-facing dialog port: ask for a yes/no decision, or show a message.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// `true` only on explicit approval. Dismissal or timeout is a decline.
    async fn confirm(&self, message: &str) -> bool;

    async fn notify(&self, message: &str);
}

#[cfg(test)]
pub mod scripted {
    use std::sync::Mutex;

    use super::*;

    /// Answers every confirmation with a fixed decision and records what it was shown.
    pub struct ScriptedPrompter {
        approve: bool,
        pub asked: Mutex<Vec<String>>,
        pub notices: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn approving() -> Self {
            Self::new(true)
        }

        pub fn declining() -> Self {
            Self::new(false)
        }

        fn new(approve: bool) -> Self {
            Self {
                approve,
                asked: Mutex::new(Vec::new()),
                notices: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Prompter for ScriptedPrompter {
        async fn confirm(&self, message: &str) -> bool {
            self.asked.lock().unwrap().push(message.to_string());
            self.approve
        }

        async fn notify(&self, message: &str) {
            self.notices.lock().unwrap().push(message.to_string());
        }
    }
}
