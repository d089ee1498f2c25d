//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by command, status
//! - `gateway_request_duration_seconds` (histogram): latency by command
//! - `gateway_backend_failures_total` (counter): failed attempts by endpoint, kind
//! - `gateway_blacklisted_endpoints` (gauge): current blacklist size
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::cluster::HostEndpoint;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one gateway response.
pub fn record_request(command: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "command" => command.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "command" => command.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed attempt against one endpoint.
pub fn record_backend_failure(endpoint: &HostEndpoint, kind: &'static str) {
    counter!(
        "gateway_backend_failures_total",
        "endpoint" => endpoint.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_blacklist_size(size: usize) {
    gauge!("gateway_blacklisted_endpoints").set(size as f64);
}
