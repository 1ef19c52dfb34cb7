//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, target
//! - `gateway_request_duration_seconds` (histogram): latency by target
//! - `gateway_mock_hits_total` (counter): requests answered by a mock
//! - `gateway_rewrites_total` (counter): bodies rewritten, by direction
//! - `gateway_upstream_errors_total` (counter): failed forwards by target, kind
//! - `gateway_recent_entries` (gauge): ring buffer occupancy
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "target" => target.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_mock_hit() {
    counter!("gateway_mock_hits_total").increment(1);
}

/// `direction` is "request" or "response".
pub fn record_rewrite(direction: &'static str) {
    counter!("gateway_rewrites_total", "direction" => direction).increment(1);
}

pub fn record_upstream_error(target: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_errors_total",
        "target" => target.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_recent_entries(len: usize) {
    gauge!("gateway_recent_entries").set(len as f64);
}
