//! Response construction and error translation.
//!
//! # Responsibilities
//! - Turn worker responses into client responses (verbatim status, headers, body)
//! - Map gateway errors to HTTP status codes in one place
//! - Convert panics in handlers into a generic 500
//!
//! # Design Decisions
//! - Hop-by-hop headers from the worker are stripped
//! - Internal error details are logged, never sent to the client

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

use crate::dispatch::WorkerResponse;
use crate::load_balancer::registry::RegistrationError;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Errors surfaced to gateway clients.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed registration payload.
    #[error("{0}")]
    InvalidRegistration(String),

    /// Malformed request to a gateway endpoint.
    #[error("{0}")]
    BadRequest(String),

    /// No worker produced an answer.
    #[error("{0}")]
    NoActiveWorker(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RegistrationError> for GatewayError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::InvalidAddress(e) => GatewayError::InvalidRegistration(e.to_string()),
            RegistrationError::IdsExhausted => GatewayError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::InvalidRegistration(message) | GatewayError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            GatewayError::NoActiveWorker(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "errorMessage": message })),
            )
                .into_response(),
            GatewayError::Internal(detail) => {
                tracing::error!(error = %detail, "Unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Hand a worker's answer back to the client unchanged.
pub fn from_worker(response: WorkerResponse) -> Response {
    let WorkerResponse {
        status,
        mut headers,
        body,
    } = response;
    for name in HOP_BY_HOP {
        headers.remove(name);
    }

    let mut out = Response::new(Body::from(body));
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

/// Response returned by the panic-catching layer.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    GatewayError::Internal(detail).into_response()
}
