//! Least-loaded selection strategy.

use std::sync::Arc;
use crate::load_balancer::{LoadBalancer, worker::Worker};

/// Selects the active worker with the lowest `requests + health failures`.
///
/// Ties go to the earliest registration, so a recycled id registered late
/// does not jump ahead of older workers.
#[derive(Debug, Default)]
pub struct LeastLoaded;

impl LeastLoaded {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for LeastLoaded {
    fn next_worker(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>> {
        workers
            .iter()
            .filter(|w| w.is_active())
            .min_by_key(|w| (w.load_score(), w.sequence))
            .cloned()
    }
}
