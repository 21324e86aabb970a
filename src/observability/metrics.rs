//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method and status
//! - `router_request_duration_seconds` (histogram): end-to-end latency
//! - `router_dispatch_total` (counter): worker outcomes, `ok` or `error`
//! - `router_worker_queue_depth` (gauge): tasks waiting for a worker
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("router_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("router_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_queue_depth(depth: usize) {
    metrics::gauge!("router_worker_queue_depth").set(depth as f64);
}
