//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): forwarded requests by method, status
//! - `proxy_request_duration_seconds` (histogram): upstream latency
//! - `webhook_config_changes_total` (counter): set / remove / rejected
//! - `webhook_dispatch_total` (counter): attempts by outcome
//! - `webhook_dispatch_duration_seconds` (histogram): attempt latency

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a request forwarded to the storage service.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("proxy_requests_total", &labels).increment(1);
    histogram!("proxy_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a webhook configuration change ("set", "remove", "rejected").
pub fn record_config_change(action: &'static str) {
    counter!("webhook_config_changes_total", "action" => action).increment(1);
}

/// Record the end of a dispatch attempt.
pub fn record_dispatch(outcome: &'static str, start: Instant) {
    counter!("webhook_dispatch_total", "outcome" => outcome).increment(1);
    histogram!("webhook_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
