//! Load-balanced call dispatcher.
//!
//! # Responsibilities
//! - Select the best worker for each forwarded operation
//! - Retry transport failures against the same worker
//! - Fall back to the next-best worker once attempts are exhausted
//! - Keep in-flight counters balanced whatever the outcome

use std::sync::Arc;
use std::time::Instant;
use tokio::time;

use crate::dispatch::client::CallError;
use crate::dispatch::operation::{Operation, WorkerResponse};
use crate::load_balancer::{Worker, WorkerRegistry};
use crate::observability::metrics;
use crate::resilience::{AttemptDecision, RetryPolicy};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<WorkerRegistry>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(registry: Arc<WorkerRegistry>, policy: RetryPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Forward `operation` to the best available worker.
    ///
    /// Returns `None` when no worker produced an answer: the pool is empty,
    /// every worker is inactive, or every selected worker kept failing at the
    /// transport level.
    pub async fn dispatch(&self, operation: &Operation) -> Option<WorkerResponse> {
        let start = Instant::now();
        let Some(mut worker) = self.registry.select_best() else {
            tracing::warn!(path = %operation.path, "No active worker to dispatch to");
            metrics::record_dispatch("no_worker", start);
            return None;
        };

        let mut tried: Vec<Arc<Worker>> = Vec::new();
        loop {
            tracing::debug!(
                worker_id = worker.id,
                path = %operation.path,
                correlation_id = ?operation.correlation_id,
                "Next worker selected"
            );
            tried.push(worker.clone());

            if let Some(response) = self.call_worker(&worker, operation).await {
                let outcome = if response.is_success() { "success" } else { "application_error" };
                metrics::record_dispatch(outcome, start);
                return Some(response);
            }

            match self.registry.select_best() {
                Some(next) if !tried.iter().any(|w| Arc::ptr_eq(w, &next)) => worker = next,
                _ => {
                    tracing::warn!(
                        path = %operation.path,
                        tried = tried.len(),
                        "All active workers tried"
                    );
                    metrics::record_dispatch("exhausted", start);
                    return None;
                }
            }
        }
    }

    /// Attempt the operation against one worker until it answers or the
    /// attempt budget runs out.
    async fn call_worker(&self, worker: &Arc<Worker>, operation: &Operation) -> Option<WorkerResponse> {
        let client = self.registry.client();

        for attempt in 1..=self.policy.max_attempts {
            tracing::debug!(
                worker_id = worker.id,
                attempt,
                max_attempts = self.policy.max_attempts,
                "Calling worker"
            );

            let result = {
                let guard = worker.begin_request();
                client.execute(&guard, operation).await
            };

            if let Err(CallError::Transport(e)) = &result {
                tracing::warn!(
                    worker_id = worker.id,
                    addr = %worker.base_url,
                    attempt,
                    error = %e,
                    "Call to worker failed"
                );
            }

            match self.policy.decide(result) {
                AttemptDecision::Return(response) => {
                    metrics::record_attempt(if response.is_success() { "success" } else { "application_error" });
                    return Some(response);
                }
                AttemptDecision::Retry => {
                    metrics::record_attempt("transport_error");
                    time::sleep(self.policy.backoff).await;
                }
            }
        }
        None
    }
}
