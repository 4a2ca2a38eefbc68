//! Shutdown coordination.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Coordinator for graceful shutdown.
///
/// Hands out one cancellation token to every long-running worker and
/// tracks the workers so shutdown can wait for them.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires when shutdown begins.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Begin shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown triggered");
        }
        self.token.cancel();
    }

    /// Spawn a worker that shutdown will wait for.
    pub fn spawn<F>(&self, name: &'static str, worker: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!(worker = name, "Starting worker");
        self.tracker.spawn(async move {
            worker.await;
            tracing::debug!(worker = name, "Worker exited");
        });
    }

    /// Workers still running.
    pub fn active_workers(&self) -> usize {
        self.tracker.len()
    }

    /// Wait up to `grace` for every worker to exit. Returns false if some were
    /// still running at the deadline.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("All workers stopped");
                true
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.active_workers(),
                    grace_secs = grace.as_secs(),
                    "Workers still running after shutdown grace period"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_cancelled_workers() {
        let shutdown = Shutdown::new();
        for _ in 0..3 {
            let token = shutdown.token();
            shutdown.spawn("test", async move { token.cancelled().await });
        }
        assert_eq!(shutdown.active_workers(), 3);

        shutdown.trigger();
        assert!(shutdown.token().is_cancelled());
        assert!(shutdown.drain(Duration::from_secs(5)).await);
        assert_eq!(shutdown.active_workers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_gives_up_after_grace() {
        let shutdown = Shutdown::new();
        shutdown.spawn("stuck", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        shutdown.trigger();
        let start = tokio::time::Instant::now();
        assert!(!shutdown.drain(Duration::from_secs(5)).await);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.token().is_cancelled());
    }
}
