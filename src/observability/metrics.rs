//! Metrics collection and exposition.
//!
//! # Metrics
//! - `playlist_guard_api_calls_total` (counter): attempts by operation and outcome
//! - `playlist_guard_token_refreshes_total` (counter): refreshes by outcome
//! - `playlist_guard_poll_cycles_total` (counter): poll cycles by outcome
//! - `playlist_guard_in_sync` (gauge): 1 when the last observed name matched

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_api_call(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "playlist_guard_api_calls_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_token_refresh(outcome: &'static str) {
    metrics::counter!("playlist_guard_token_refreshes_total", "outcome" => outcome).increment(1);
}

pub fn record_poll_cycle(outcome: &'static str) {
    metrics::counter!("playlist_guard_poll_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_in_sync(in_sync: bool) {
    metrics::gauge!("playlist_guard_in_sync").set(if in_sync { 1.0 } else { 0.0 });
}
