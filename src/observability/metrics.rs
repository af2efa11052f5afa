//! Metrics collection and exposition.
//!
//! # Metrics
//! - `keyhold_requests_admitted_total` (counter): requests that consumed a token
//! - `keyhold_requests_rate_limited_total` (counter): rejections by route
//! - `keyhold_admission_buckets` (gauge): live token buckets
//!
//! Recording is a no-op until a recorder is installed.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder with an HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admitted() {
    counter!("keyhold_requests_admitted_total").increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("keyhold_requests_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_bucket_count(count: usize) {
    gauge!("keyhold_admission_buckets").set(count as f64);
}
