//! Correlation ID handling.
//!
//! # Responsibilities
//! - Reuse the inbound `X-Correlation-ID` or generate a UUID v4
//! - Echo the id on every response
//! - Expose the id to handlers so it can be forwarded to workers

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the correlation id.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

fn header_name() -> HeaderName {
    HeaderName::from_static(X_CORRELATION_ID)
}

/// Generates a UUID v4 for requests arriving without a correlation id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Layer that fills in a missing correlation id on the request.
pub fn set_correlation_id_layer() -> SetRequestIdLayer<MakeCorrelationId> {
    SetRequestIdLayer::new(header_name(), MakeCorrelationId)
}

/// Layer that copies the request's correlation id onto the response.
pub fn propagate_correlation_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header_name())
}

/// Correlation id of an inbound request, if it carries a valid one.
pub fn correlation_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
