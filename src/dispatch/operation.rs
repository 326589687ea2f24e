//! Operations forwarded to workers and the responses they produce.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use std::time::Duration;

use crate::config::DispatchConfig;

/// A call the dispatcher performs against whichever worker it selects.
#[derive(Debug, Clone)]
pub struct Operation {
    pub method: Method,
    /// Path on the worker, relative to its base URL.
    pub path: String,
    /// JSON payload for POST operations.
    pub body: Option<Bytes>,
    /// Correlation id propagated to the worker.
    pub correlation_id: Option<String>,
}

impl Operation {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            correlation_id: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Bytes) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: Option<String>) -> Self {
        self.correlation_id = id;
        self
    }

    /// Deadline for one attempt of this operation.
    pub fn timeout(&self, config: &DispatchConfig) -> Duration {
        if self.method == Method::POST {
            Duration::from_millis(config.post_timeout_ms)
        } else {
            Duration::from_millis(config.get_timeout_ms)
        }
    }
}

/// A fully buffered answer from a worker.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WorkerResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
