//! Shutdown coordination for the gateway.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Force the process down if cleanup has not finished within `deadline`.
pub fn spawn_deadline(deadline: Duration) -> JoinHandle<()> {
    spawn_deadline_with(deadline, || std::process::exit(1))
}

/// Run `on_expiry` once `deadline` elapses.
pub fn spawn_deadline_with<F>(deadline: Duration, on_expiry: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        tracing::error!(
            deadline_secs = deadline.as_secs(),
            "Could not shut down in time, forcefully shutting down"
        );
        on_expiry();
    })
}
