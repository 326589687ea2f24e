//! Outbound HTTP calls to workers.
//!
//! # Responsibilities
//! - Health probe (`GET /system/health`, 200 only)
//! - Unregister notice (`POST /system/unregister` with `{id}`)
//! - Forwarded operations with per-method deadlines
//! - Classify failures as transport-level or application-level

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;
use thiserror::Error;
use tokio::time;

use crate::config::{DispatchConfig, HealthCheckConfig, WorkerConfig};
use crate::dispatch::operation::{Operation, WorkerResponse};
use crate::http::request::X_CORRELATION_ID;
use crate::load_balancer::worker::Worker;

/// Largest worker response body the gateway buffers.
const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// The worker never produced a usable HTTP answer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed reading response body: {0}")]
    Body(#[from] axum::Error),

    #[error("invalid request: {0}")]
    Build(#[from] axum::http::Error),
}

/// Outcome of a failed call.
#[derive(Debug, Error)]
pub enum CallError {
    /// Connection failure, timeout or no response at all.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The worker answered, but not with a success status.
    #[error("worker answered with status {}", .0.status)]
    Application(WorkerResponse),
}

/// Calls the gateway makes against a single worker.
pub trait WorkerClient: Send + Sync + 'static {
    /// Probe the worker's health endpoint.
    fn probe<'a>(&'a self, worker: &'a Worker) -> BoxFuture<'a, Result<(), CallError>>;

    /// Tell the worker it has been removed from the pool.
    fn notify_unregister<'a>(&'a self, worker: &'a Worker) -> BoxFuture<'a, Result<(), CallError>>;

    /// Perform a forwarded operation.
    fn execute<'a>(
        &'a self,
        worker: &'a Worker,
        operation: &'a Operation,
    ) -> BoxFuture<'a, Result<WorkerResponse, CallError>>;
}

/// `WorkerClient` over a shared hyper connection pool.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: Client<HttpConnector, Body>,
    health: HealthCheckConfig,
    workers: WorkerConfig,
    dispatch: DispatchConfig,
}

impl HttpWorkerClient {
    pub fn new(health: HealthCheckConfig, workers: WorkerConfig, dispatch: DispatchConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            health,
            workers,
            dispatch,
        }
    }

    /// Send a request and buffer the full response under one deadline.
    async fn send(&self, request: Request<Body>, timeout: Duration) -> Result<WorkerResponse, TransportError> {
        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BYTES).await?;
            Ok::<_, TransportError>(WorkerResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        time::timeout(timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
    }
}

fn build_request(
    method: Method,
    uri: &str,
    body: Option<Bytes>,
    correlation_id: Option<&str>,
) -> Result<Request<Body>, axum::http::Error> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONNECTION, "close")
        .header(header::USER_AGENT, "worker-gateway");

    if let Some(id) = correlation_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        builder = builder.header(X_CORRELATION_ID, id);
    }

    match body {
        Some(bytes) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes)),
        None => builder.body(Body::empty()),
    }
}

/// Non-2xx answers become `CallError::Application`.
fn classify(response: WorkerResponse) -> Result<WorkerResponse, CallError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(CallError::Application(response))
    }
}

impl WorkerClient for HttpWorkerClient {
    fn probe<'a>(&'a self, worker: &'a Worker) -> BoxFuture<'a, Result<(), CallError>> {
        Box::pin(async move {
            let url = worker.endpoint(&self.health.path);
            tracing::debug!(worker_id = worker.id, url = %url, "Probing worker");

            let request = build_request(Method::GET, url.as_str(), None, None)
                .map_err(TransportError::from)?;
            let response = self.send(request, self.health.timeout()).await?;
            if response.status == StatusCode::OK {
                Ok(())
            } else {
                Err(CallError::Application(response))
            }
        })
    }

    fn notify_unregister<'a>(&'a self, worker: &'a Worker) -> BoxFuture<'a, Result<(), CallError>> {
        Box::pin(async move {
            let url = worker.endpoint(&self.workers.unregister_path);
            let payload = Bytes::from(serde_json::json!({ "id": worker.id }).to_string());

            let request = build_request(Method::POST, url.as_str(), Some(payload), None)
                .map_err(TransportError::from)?;
            let timeout = Duration::from_millis(self.workers.unregister_timeout_ms);
            classify(self.send(request, timeout).await?).map(|_| ())
        })
    }

    fn execute<'a>(
        &'a self,
        worker: &'a Worker,
        operation: &'a Operation,
    ) -> BoxFuture<'a, Result<WorkerResponse, CallError>> {
        Box::pin(async move {
            let url = worker.endpoint(&operation.path);
            let request = build_request(
                operation.method.clone(),
                url.as_str(),
                operation.body.clone(),
                operation.correlation_id.as_deref(),
            )
            .map_err(TransportError::from)?;

            classify(self.send(request, operation.timeout(&self.dispatch)).await?)
        })
    }
}
