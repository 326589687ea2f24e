//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_dispatch_total` (counter): dispatch calls by outcome
//! - `gateway_dispatch_duration_seconds` (histogram): dispatch latency, retries included
//! - `gateway_dispatch_attempts_total` (counter): single worker calls by result
//! - `gateway_health_checks_total` (counter): probes by result
//! - `gateway_worker_deactivations_total` (counter): health-driven deactivations
//! - `gateway_workers_registered` (gauge): workers currently in the registry
//!
//! Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the end of a dispatch call.
pub fn record_dispatch(outcome: &'static str, start: Instant) {
    metrics::counter!("gateway_dispatch_total", "outcome" => outcome).increment(1);
    metrics::histogram!("gateway_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one attempt against a worker.
pub fn record_attempt(result: &'static str) {
    metrics::counter!("gateway_dispatch_attempts_total", "result" => result).increment(1);
}

pub fn record_health_check(healthy: bool) {
    let result = if healthy { "ok" } else { "failed" };
    metrics::counter!("gateway_health_checks_total", "result" => result).increment(1);
}

pub fn record_deactivation() {
    metrics::counter!("gateway_worker_deactivations_total").increment(1);
}

pub fn set_registered_workers(count: usize) {
    metrics::gauge!("gateway_workers_registered").set(count as f64);
}
