use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::backend::Backend;

/// Result of one health probe. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSnapshot {
    pub backend_up: bool,
    /// Generation/embedding collaborator (Ollama) behind the backend.
    pub collaborator_up: bool,
    pub total_documents: u64,
    pub total_chunks: u64,
    /// Set only when the probe itself failed.
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthSnapshot {
    pub fn reported(
        backend_up: bool,
        collaborator_up: bool,
        total_documents: u64,
        total_chunks: u64,
    ) -> Self {
        Self {
            backend_up,
            collaborator_up,
            total_documents,
            total_chunks,
            error: None,
            checked_at: Utc::now(),
        }
    }

    /// Degraded snapshot for a probe that could not complete.
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            backend_up: false,
            collaborator_up: false,
            total_documents: 0,
            total_chunks: 0,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.backend_up && self.collaborator_up
    }
}

/// Shortest polling period accepted by [`HealthMonitor::activate`].
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Periodic health prober. Holds only the latest snapshot.
pub struct HealthMonitor {
    task: JoinHandle<()>,
    latest: watch::Receiver<Option<HealthSnapshot>>,
}

impl HealthMonitor {
    /// Probe once now, then once every `period`, until the monitor is
    /// deactivated or dropped.
    /// Periods below [`MIN_PERIOD`] are raised to it.
    pub fn activate(backend: Arc<dyn Backend>, period: Duration) -> Self {
        let period = if period < MIN_PERIOD {
            warn!(requested = ?period, "health period too short, using minimum");
            MIN_PERIOD
        } else {
            period
        };
        let (tx, latest) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let snapshot = backend.probe_health().await;

                let was_healthy = tx.borrow().as_ref().map(HealthSnapshot::is_healthy);
                if was_healthy != Some(snapshot.is_healthy()) {
                    info!(
                        backend_up = snapshot.backend_up,
                        collaborator_up = snapshot.collaborator_up,
                        error = snapshot.error.as_deref().unwrap_or(""),
                        "backend health changed"
                    );
                }
                tx.send_replace(Some(snapshot));
            }
        });

        debug!(period_secs = period.as_secs_f64(), "health monitor activated");
        Self { task, latest }
    }

    /// Latest snapshot, `None` before the first probe completes.
    pub fn latest(&self) -> Option<HealthSnapshot> {
        self.latest.borrow().clone()
    }

    /// Receiver that is notified whenever a new snapshot lands.
    pub fn subscribe(&self) -> watch::Receiver<Option<HealthSnapshot>> {
        self.latest.clone()
    }

    /// Stop probing. Subscribers see their channel close.
    pub fn deactivate(self) {
        drop(self);
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.task.abort();
        debug!("health monitor deactivated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    const PERIOD: Duration = Duration::from_secs(15);

    #[tokio::test(start_paused = true)]
    async fn test_probes_immediately_then_every_period() {
        let backend = Arc::new(FakeBackend::default());
        let monitor = HealthMonitor::activate(backend.clone(), PERIOD);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(backend.probe_calls(), 1);
        assert!(monitor.latest().is_some());

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(backend.probe_calls(), 4);

        monitor.deactivate();
        tokio::time::sleep(PERIOD * 10).await;
        assert_eq!(backend.probe_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_is_replaced_wholesale() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_health(HealthSnapshot::reported(true, true, 2, 10));
        let monitor = HealthMonitor::activate(backend.clone(), PERIOD);
        let mut updates = monitor.subscribe();

        updates.changed().await.unwrap();
        assert_eq!(monitor.latest().unwrap().total_chunks, 10);

        backend.set_health(HealthSnapshot::unreachable("connection refused"));
        updates.changed().await.unwrap();
        let latest = monitor.latest().unwrap();
        assert!(!latest.backend_up);
        assert_eq!(latest.total_chunks, 0);
        assert_eq!(latest.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_close_after_deactivate() {
        let backend = Arc::new(FakeBackend::default());
        let monitor = HealthMonitor::activate(backend, PERIOD);
        let mut updates = monitor.subscribe();
        updates.changed().await.unwrap();

        monitor.deactivate();
        // Abort lands on the next scheduler turn; the sender goes with the task.
        assert!(updates.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_raised_to_minimum() {
        let backend = Arc::new(FakeBackend::default());
        let monitor = HealthMonitor::activate(backend.clone(), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(backend.probe_calls(), 1);

        tokio::time::sleep(MIN_PERIOD * 3).await;
        assert_eq!(backend.probe_calls(), 4);
        monitor.deactivate();
    }
}
