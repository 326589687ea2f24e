//! Worker gateway library.
//!
//! Keeps a registry of worker processes, watches their health and forwards
//! business requests to the least loaded active worker.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod health;
pub mod load_balancer;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
