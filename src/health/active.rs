//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe one worker
//! - Drive that worker through the health state machine
//! - Stop as soon as the worker leaves the registry

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::state::{HealthPolicy, HealthState, Transition};
use crate::load_balancer::{Worker, WorkerRegistry};
use crate::observability::metrics;

/// Why a polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// The worker was unregistered by someone else.
    Unregistered,
    /// The loop removed the worker after too many deactivations.
    RemovedUnhealthy,
}

/// Polling loop bound to a single worker.
pub struct HealthMonitor {
    registry: Arc<WorkerRegistry>,
    worker: Arc<Worker>,
    config: HealthCheckConfig,
    policy: HealthPolicy,
}

impl HealthMonitor {
    pub fn new(registry: Arc<WorkerRegistry>, worker: Arc<Worker>, config: HealthCheckConfig) -> Self {
        let policy = HealthPolicy::from(&config);
        Self {
            registry,
            worker,
            config,
            policy,
        }
    }

    /// Starts the polling task.
    pub fn spawn(self) -> JoinHandle<MonitorExit> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> MonitorExit {
        let worker_id = self.worker.id;
        let mut retired = self.worker.retirement();
        tracing::info!(worker_id, path = %self.config.path, "Health monitor starting");

        loop {
            if !self.registry.contains(&self.worker) {
                break;
            }

            let pause = match self.check_once().await {
                HealthState::Removed => {
                    self.remove().await;
                    return MonitorExit::RemovedUnhealthy;
                }
                HealthState::Deactivated => self.config.deactivation_hold(),
                HealthState::Active => self.config.interval(),
            };

            tokio::select! {
                _ = time::sleep(pause) => {}
                _ = retired.changed() => break,
            }
        }

        tracing::info!(worker_id, "Worker is no longer registered, health monitor stopping");
        MonitorExit::Unregistered
    }

    /// Probe once and apply the resulting transition.
    async fn check_once(&self) -> HealthState {
        let worker = &self.worker;
        tracing::debug!(worker_id = worker.id, "Checking worker health");

        let transition = match self.registry.client().probe(worker).await {
            Ok(()) => {
                tracing::debug!(worker_id = worker.id, "Health check OK");
                Transition::Healthy
            }
            Err(e) => {
                let failures = worker.record_probe_failure();
                tracing::warn!(worker_id = worker.id, failures, error = %e, "Health check failed");
                self.policy.on_failure(failures, worker.deactivations())
            }
        };
        metrics::record_health_check(matches!(transition, Transition::Healthy));

        if transition == Transition::Deactivate {
            tracing::info!(worker_id = worker.id, "Deactivating unresponsive worker");
            worker.deactivate();
            metrics::record_deactivation();
            self.schedule_reactivation();
        }
        transition.next_state()
    }

    /// Reactivate this exact worker instance after the deactivation delay,
    /// unless it has left the registry in the meantime.
    fn schedule_reactivation(&self) -> JoinHandle<bool> {
        let registry = self.registry.clone();
        let worker = self.worker.clone();
        let delay = self.config.deactivation();

        tokio::spawn(async move {
            time::sleep(delay).await;
            if registry.contains(&worker) {
                worker.activate();
                true
            } else {
                tracing::debug!(worker_id = worker.id, "Skipping reactivation of unregistered worker");
                false
            }
        })
    }

    async fn remove(&self) {
        tracing::warn!(
            worker_id = self.worker.id,
            deactivations = self.worker.deactivations(),
            "Unregistering worker for its unhealthy state"
        );
        self.registry.unregister_worker(&self.worker).await;
    }
}
