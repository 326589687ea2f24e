//! Route handlers.
//!
//! Pool management routes talk to the registry directly. Business routes are
//! thin: they package an `Operation` and hand it to the dispatcher.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::dispatch::Operation;
use crate::health::HealthMonitor;
use crate::http::request::correlation_id;
use crate::http::response::{from_worker, GatewayError};
use crate::http::server::AppState;
use crate::load_balancer::{RegisterRequest, WorkerId, WorkerSnapshot};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: WorkerId,
}

#[derive(Debug, Deserialize)]
pub struct UnregisterRequest {
    pub id: WorkerId,
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRegistration(e.body_text()))?;
    tracing::info!(host = %request.host, port = request.port, "Registration requested");

    let registration = state.registry.register(&request)?;
    if registration.created && state.health.enabled {
        HealthMonitor::new(
            state.registry.clone(),
            registration.worker.clone(),
            state.health.clone(),
        )
        .spawn();
    }

    Ok(Json(RegisterResponse {
        id: registration.worker.id,
    }))
}

/// `POST /unregister`
pub async fn unregister(
    State(state): State<AppState>,
    payload: Result<Json<UnregisterRequest>, JsonRejection>,
) -> Result<StatusCode, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::BadRequest(e.body_text()))?;
    tracing::info!(worker_id = request.id, "Unregistration requested");

    state.registry.unregister(request.id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /health`
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// `GET /workers`
pub async fn list_workers(State(state): State<AppState>) -> Json<Vec<WorkerSnapshot>> {
    Json(state.registry.snapshots())
}

/// `POST /balance`
pub async fn set_balance(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let operation = Operation::post("api/balance/", body);
    forward(&state, &headers, operation, "No balance set: no response received from active workers.").await
}

/// `GET /balance/{userId}`
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let operation = Operation::get(format!("api/balance/{}", user_id));
    let message = format!("No balance received for userId [{}] from active workers.", user_id);
    forward(&state, &headers, operation, &message).await
}

/// `POST /check/{payerId}`
pub async fn create_check(
    State(state): State<AppState>,
    Path(payer_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let operation = Operation::post(format!("api/check/{}", payer_id), body);
    let message = format!("No check created for payerId [{}].", payer_id);
    forward(&state, &headers, operation, &message).await
}

/// `POST /check/{recipientId}/cash/{checkId}`
pub async fn cash_check(
    State(state): State<AppState>,
    Path((recipient_id, check_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let operation = Operation::post(format!("api/check/{}/cash/{}", recipient_id, check_id), body);
    let message = format!(
        "No check cashed for checkId [{}] for recipientId [{}].",
        check_id, recipient_id
    );
    forward(&state, &headers, operation, &message).await
}

/// `GET /hello`
pub async fn hello(State(state): State<AppState>, headers: HeaderMap) -> Response {
    forward(
        &state,
        &headers,
        Operation::get("hello"),
        "No response received from active workers.",
    )
    .await
}

/// Unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

async fn forward(state: &AppState, headers: &HeaderMap, operation: Operation, unavailable: &str) -> Response {
    let operation = operation.with_correlation_id(correlation_id(headers));
    match state.dispatcher.dispatch(&operation).await {
        Some(response) => from_worker(response),
        None => GatewayError::NoActiveWorker(unavailable.to_string()).into_response(),
    }
}
