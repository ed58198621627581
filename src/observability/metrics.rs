//! Metrics collection and exposition.
//!
//! # Metrics
//! - `knock_requests_total` (counter): knocks by outcome
//! - `gate_requests_total` (counter): gate requests by result
//! - `access_grants_total` (counter): grants issued
//! - `access_expired_total` (counter): entries removed by expiry
//! - `allowlist_size` (gauge): current allowlist entries
//!
//! Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_knock(outcome: &'static str) {
    metrics::counter!("knock_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_gate(result: &'static str) {
    metrics::counter!("gate_requests_total", "result" => result).increment(1);
}

pub fn record_grant() {
    metrics::counter!("access_grants_total").increment(1);
}

pub fn record_expired(count: usize) {
    metrics::counter!("access_expired_total").increment(count as u64);
}

pub fn record_allowlist_size(size: usize) {
    metrics::gauge!("allowlist_size").set(size as f64);
}
