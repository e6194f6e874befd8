//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by route, status, outcome
//! - `relay_request_duration_seconds` (histogram): end-to-end relay latency
//! - `waitlist_submissions_total` (counter): waitlist joins by result
//!
//! Without an installed recorder every call here is a no-op, which is what
//! tests and metrics-disabled deployments get.

use std::net::SocketAddr;
use std::time::Instant;

use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::error::RelayError;
use crate::relay::RelayRoute;

/// Start the Prometheus scrape listener and install the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the terminal state of one relayed request.
pub fn record_relay(route: RelayRoute, result: &Result<Response, RelayError>, started: Instant) {
    let (status, outcome) = match result {
        Ok(response) => (response.status().as_u16(), "responded"),
        Err(err) => (err.status().as_u16(), err.outcome()),
    };

    metrics::counter!(
        "relay_requests_total",
        "route" => route.as_str(),
        "status" => status.to_string(),
        "outcome" => outcome,
    )
    .increment(1);

    metrics::histogram!("relay_request_duration_seconds", "route" => route.as_str())
        .record(started.elapsed().as_secs_f64());
}

/// Record a waitlist submission: `created`, `duplicate`, `invalid` or `failed`.
pub fn record_waitlist(result: &'static str) {
    metrics::counter!("waitlist_submissions_total", "result" => result).increment(1);
}
