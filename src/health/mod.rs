//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Worker registered
//!     → active.rs spawns one polling loop for it
//!     → probe GET /system/health
//!     → state.rs decides the transition
//!     → worker deactivated, reactivated later, or unregistered
//! ```
//!
//! # Design Decisions
//! - One loop per worker, torn down when the worker leaves the registry
//! - Reactivation is bound to the worker instance, not its id
//! - Health state is per-worker, not per-pool

pub mod active;
pub mod state;

pub use active::{HealthMonitor, MonitorExit};
pub use state::{HealthPolicy, HealthState, Transition};
