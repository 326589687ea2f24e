//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (worker_id, attempt, addr) on every worker event
//! - Correlation ID flows from the inbound request to the worker call
//! - Metrics endpoint is optional

pub mod logging;
pub mod metrics;
