//! Worker registry.
//!
//! # Responsibilities
//! - Own the set of registered workers
//! - Allocate ids, recycling freed ids smallest-first
//! - Notify workers when they leave the pool
//! - Select the best worker for a dispatch

use futures_util::future::join_all;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::dispatch::client::WorkerClient;
use crate::load_balancer::{
    least_loaded::LeastLoaded,
    worker::{worker_base_url, InvalidAddress, Worker, WorkerId, WorkerSnapshot},
    LoadBalancer,
};
use crate::observability::metrics;

/// Body of `POST /register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Id the worker already holds, if it is re-registering.
    #[serde(default)]
    pub id: Option<WorkerId>,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),

    #[error("worker id space exhausted")]
    IdsExhausted,
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub worker: Arc<Worker>,
    /// False when the id was already registered and the existing worker was returned.
    pub created: bool,
}

#[derive(Debug, Default)]
struct RegistryState {
    workers: HashMap<WorkerId, Arc<Worker>>,
    free_ids: BTreeSet<WorkerId>,
    /// Highest id ever handed out by the counter.
    allocated: WorkerId,
    next_sequence: u64,
}

impl RegistryState {
    fn allocate_id(&mut self, requested: Option<WorkerId>) -> Result<WorkerId, RegistrationError> {
        if let Some(id) = requested.filter(|id| *id > 0) {
            self.free_ids.remove(&id);
            return Ok(id);
        }
        if let Some(id) = self.free_ids.pop_first() {
            return Ok(id);
        }
        // Skip ids claimed explicitly by re-registering workers.
        loop {
            self.allocated = self
                .allocated
                .checked_add(1)
                .ok_or(RegistrationError::IdsExhausted)?;
            if !self.workers.contains_key(&self.allocated) {
                return Ok(self.allocated);
            }
        }
    }

    fn ordered(&self) -> Vec<Arc<Worker>> {
        let mut workers: Vec<_> = self.workers.values().cloned().collect();
        workers.sort_by_key(|w| w.sequence);
        workers
    }
}

/// Owns every registered worker. Shared via `Arc` with the dispatcher,
/// the health monitors and the HTTP handlers.
pub struct WorkerRegistry {
    state: Mutex<RegistryState>,
    balancer: Box<dyn LoadBalancer>,
    client: Arc<dyn WorkerClient>,
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("workers", &self.len())
            .field("balancer", &self.balancer)
            .finish()
    }
}

impl WorkerRegistry {
    /// Create an empty registry using least-loaded selection.
    pub fn new(client: Arc<dyn WorkerClient>) -> Self {
        Self::with_balancer(client, Box::new(LeastLoaded::new()))
    }

    pub fn with_balancer(client: Arc<dyn WorkerClient>, balancer: Box<dyn LoadBalancer>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            balancer,
            client,
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Client used for outbound calls to the workers.
    pub fn client(&self) -> &Arc<dyn WorkerClient> {
        &self.client
    }

    /// Register a worker, or return the existing one if its id is already held.
    pub fn register(&self, request: &RegisterRequest) -> Result<Registration, RegistrationError> {
        tracing::debug!(
            id = ?request.id,
            host = %request.host,
            port = request.port,
            "Registering worker"
        );

        let mut state = self.state();
        if let Some(existing) = request.id.and_then(|id| state.workers.get(&id)) {
            tracing::info!(worker_id = existing.id, "Worker already registered");
            return Ok(Registration {
                worker: existing.clone(),
                created: false,
            });
        }

        // Validate the address before consuming an id.
        let base_url = worker_base_url(&request.host, request.port)?;

        let id = state.allocate_id(request.id)?;
        let sequence = state.next_sequence;
        let worker = Arc::new(Worker::with_base_url(
            id,
            &request.host,
            request.port,
            base_url,
            sequence,
        ));
        state.next_sequence += 1;
        state.workers.insert(id, worker.clone());
        let count = state.workers.len();
        drop(state);

        metrics::set_registered_workers(count);
        tracing::info!(worker_id = id, addr = %worker.base_url, "Registered worker");
        Ok(Registration {
            worker,
            created: true,
        })
    }

    /// Remove a worker and notify it.
    ///
    /// Removal is immediate and unconditional; the notification is awaited but
    /// its failure is only logged. Returns `None` if `id` was not registered.
    pub async fn unregister(&self, id: WorkerId) -> Option<Arc<Worker>> {
        let worker = self.detach(id, None)?;
        self.notify_removed(&worker).await;
        Some(worker)
    }

    /// Like [`unregister`](Self::unregister), but only if `worker` is still the
    /// instance registered under its id.
    pub async fn unregister_worker(&self, worker: &Arc<Worker>) -> bool {
        match self.detach(worker.id, Some(worker)) {
            Some(removed) => {
                self.notify_removed(&removed).await;
                true
            }
            None => false,
        }
    }

    fn detach(&self, id: WorkerId, expected: Option<&Arc<Worker>>) -> Option<Arc<Worker>> {
        let (worker, count) = {
            let mut state = self.state();
            let current = state.workers.get(&id)?;
            if expected.is_some_and(|e| !Arc::ptr_eq(e, current)) {
                return None;
            }
            let worker = state.workers.remove(&id)?;
            state.free_ids.insert(id);
            (worker, state.workers.len())
        };
        worker.retire();
        metrics::set_registered_workers(count);
        tracing::info!(worker_id = id, "Unregistered worker");
        Some(worker)
    }

    async fn notify_removed(&self, worker: &Worker) {
        if let Err(e) = self.client.notify_unregister(worker).await {
            tracing::warn!(
                worker_id = worker.id,
                error = %e,
                "Failed to notify worker about unregistration"
            );
        }
    }

    /// Unregister every worker concurrently and wait for all notifications.
    pub async fn unregister_all(&self) -> usize {
        let ids: Vec<WorkerId> = self.state().ordered().iter().map(|w| w.id).collect();
        let removed = join_all(ids.into_iter().map(|id| self.unregister(id))).await;
        removed.into_iter().flatten().count()
    }

    /// The active worker with the lowest load score, if any.
    pub fn select_best(&self) -> Option<Arc<Worker>> {
        let workers = self.state().ordered();
        let best = self.balancer.next_worker(&workers);
        match &best {
            Some(w) => tracing::debug!(worker_id = w.id, score = w.load_score(), "Best worker selected"),
            None => tracing::debug!(registered = workers.len(), "No active worker available"),
        }
        best
    }

    pub fn has(&self, id: WorkerId) -> bool {
        self.state().workers.contains_key(&id)
    }

    /// True if this exact worker instance is still registered.
    ///
    /// An id recycled for a new worker does not count.
    pub fn contains(&self, worker: &Arc<Worker>) -> bool {
        self.state()
            .workers
            .get(&worker.id)
            .is_some_and(|w| Arc::ptr_eq(w, worker))
    }

    pub fn get(&self, id: WorkerId) -> Option<Arc<Worker>> {
        self.state().workers.get(&id).cloned()
    }

    /// All workers in registration order.
    pub fn list(&self) -> Vec<Arc<Worker>> {
        self.state().ordered()
    }

    pub fn snapshots(&self) -> Vec<WorkerSnapshot> {
        self.list().iter().map(|w| w.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.state().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
