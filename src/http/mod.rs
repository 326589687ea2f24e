//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (correlation ID set/propagated)
//!     → handlers.rs (registry routes, or Operation → dispatcher)
//!     → response.rs (worker response verbatim, or mapped GatewayError)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_CORRELATION_ID;
pub use response::GatewayError;
pub use server::{AppState, GatewayServer};
