//! Worker abstraction.
//!
//! # Responsibilities
//! - Represent a single registered worker node
//! - Track in-flight dispatched calls (for least-loaded selection)
//! - Track health counters and the activation flag
//! - Signal retirement to the worker's polling loop
//!
//! Counters are atomics: the dispatcher and the health monitor mutate the same
//! worker concurrently, and reads may be stale but never torn.

use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

/// Identifier handed out by the registry. Always positive.
pub type WorkerId = u32;

/// A worker address that cannot be turned into a base URL.
#[derive(Debug, Error)]
#[error("invalid worker address '{host}:{port}': {reason}")]
pub struct InvalidAddress {
    pub host: String,
    pub port: u16,
    pub reason: String,
}

/// Build the base URL of a worker.
///
/// `host` may carry its own scheme (`http://10.0.0.7`); plain hosts get `http`.
pub fn worker_base_url(host: &str, port: u16) -> Result<Url, InvalidAddress> {
    let invalid = |reason: String| InvalidAddress {
        host: host.to_string(),
        port,
        reason,
    };

    if host.trim().is_empty() {
        return Err(invalid("empty host".to_string()));
    }

    let mut url = if host.contains("://") {
        Url::parse(host).map_err(|e| invalid(e.to_string()))?
    } else {
        Url::parse(&format!("http://{}", host)).map_err(|e| invalid(e.to_string()))?
    };

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    url.set_port(Some(port))
        .map_err(|_| invalid("scheme does not accept a port".to_string()))?;
    Ok(url)
}

/// A single registered worker.
#[derive(Debug)]
pub struct Worker {
    /// Registry-assigned identifier.
    pub id: WorkerId,
    /// Host as given at registration.
    pub host: String,
    /// Port as given at registration.
    pub port: u16,
    /// Pre-calculated base URL for outbound calls.
    pub base_url: Url,
    /// Registration sequence number, used as the selection tie-break.
    pub(crate) sequence: u64,

    active: AtomicBool,
    health_check_failures: AtomicU32,
    requests: AtomicUsize,
    deactivations: AtomicU32,
    retired: watch::Sender<bool>,
}

impl Worker {
    /// Create an active worker with all counters at zero.
    pub fn new(id: WorkerId, host: &str, port: u16, sequence: u64) -> Result<Self, InvalidAddress> {
        let base_url = worker_base_url(host, port)?;
        Ok(Self::with_base_url(id, host, port, base_url, sequence))
    }

    /// Build a worker around an already resolved base URL.
    pub(crate) fn with_base_url(id: WorkerId, host: &str, port: u16, base_url: Url, sequence: u64) -> Self {
        let (retired, _) = watch::channel(false);
        Self {
            id,
            host: host.to_string(),
            port,
            base_url,
            sequence,
            active: AtomicBool::new(true),
            health_check_failures: AtomicU32::new(0),
            requests: AtomicUsize::new(0),
            deactivations: AtomicU32::new(0),
            retired,
        }
    }

    /// Absolute URL of `path` on this worker.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Consecutive failed probes since the last activation.
    pub fn health_check_failures(&self) -> u32 {
        self.health_check_failures.load(Ordering::Relaxed)
    }

    /// Calls currently in flight against this worker.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Lifetime number of health-driven deactivations.
    pub fn deactivations(&self) -> u32 {
        self.deactivations.load(Ordering::Relaxed)
    }

    /// Selection score: lower is better.
    pub fn load_score(&self) -> usize {
        self.requests() + self.health_check_failures() as usize
    }

    /// Record a failed probe and return the new consecutive failure count.
    pub fn record_probe_failure(&self) -> u32 {
        self.health_check_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Take the worker out of rotation. Returns the lifetime deactivation count.
    pub fn deactivate(&self) -> u32 {
        self.active.store(false, Ordering::Release);
        let count = self.deactivations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(worker_id = self.id, deactivations = count, "Worker deactivated");
        count
    }

    /// Put the worker back in rotation and clear its failure streak.
    pub fn activate(&self) {
        self.health_check_failures.store(0, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
        tracing::info!(worker_id = self.id, addr = %self.base_url, "Worker activated");
    }

    /// Count one in-flight call until the returned guard is dropped.
    pub fn begin_request(self: &Arc<Self>) -> InFlightGuard {
        self.requests.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            worker: self.clone(),
        }
    }

    /// Mark the worker as gone from the registry.
    pub(crate) fn retire(&self) {
        self.retired.send_replace(true);
    }

    pub fn is_retired(&self) -> bool {
        *self.retired.borrow()
    }

    /// Receiver that observes `true` once the worker leaves the registry.
    pub fn retirement(&self) -> watch::Receiver<bool> {
        self.retired.subscribe()
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id,
            host: self.host.clone(),
            port: self.port,
            is_active: self.is_active(),
            health_check_failed_counter: self.health_check_failures(),
            requests_counter: self.requests(),
            disabled_by_failing_counter: self.deactivations(),
        }
    }
}

/// Point-in-time view of a worker, as exposed on `GET /workers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub host: String,
    pub port: u16,
    pub is_active: bool,
    pub health_check_failed_counter: u32,
    pub requests_counter: usize,
    pub disabled_by_failing_counter: u32,
}

/// A RAII guard that manages the in-flight request count.
#[derive(Debug)]
pub struct InFlightGuard {
    worker: Arc<Worker>,
}

impl Deref for InFlightGuard {
    type Target = Worker;
    fn deref(&self) -> &Self::Target {
        &self.worker
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.worker.requests.fetch_sub(1, Ordering::Relaxed);
    }
}
