//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Route handler builds an Operation
//!     → dispatcher.rs (select worker, retry, fall back)
//!     → client.rs (outbound HTTP call with deadline)
//!     → WorkerResponse returned verbatim, or None (503 upstream)
//! ```

pub mod client;
pub mod dispatcher;
pub mod operation;

pub use client::{CallError, HttpWorkerClient, TransportError, WorkerClient};
pub use dispatcher::Dispatcher;
pub use operation::{Operation, WorkerResponse};
