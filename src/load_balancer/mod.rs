//! Worker pool and load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! POST /register
//!     → registry.rs (allocate or recycle id, store worker)
//!     → health monitor spawned for the worker
//!
//! Dispatch
//!     → registry.rs (snapshot of workers in registration order)
//!     → least_loaded.rs (pick active worker with lowest load score)
//!     → worker.rs (in-flight guard around the call)
//! ```
//!
//! # Design Decisions
//! - Selection is a linear scan; pools are small
//! - Inactive workers excluded from selection
//! - Registry lock is never held across an await point

pub mod least_loaded;
pub mod registry;
pub mod worker;

use std::sync::Arc;

/// Strategy for picking a worker out of the registered set.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next worker. `workers` is in registration order.
    fn next_worker(&self, workers: &[Arc<Worker>]) -> Option<Arc<Worker>>;
}

pub use registry::{RegisterRequest, WorkerRegistry};
pub use worker::{InFlightGuard, Worker, WorkerId, WorkerSnapshot};
