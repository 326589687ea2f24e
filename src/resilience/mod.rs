//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to worker:
//!     → dispatch/client.rs (every outbound call has a deadline)
//!     → On failure: retries.rs (retry transport errors with fixed backoff)
//!     → On exhaustion: dispatcher falls back to the next-best worker
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Application responses are authoritative and never retried

pub mod retries;

pub use retries::{AttemptDecision, RetryPolicy};
