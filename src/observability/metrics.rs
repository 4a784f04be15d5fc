//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by outcome
//!   (`route`, `fallback`, `pass_through`)
//! - `dispatch_cache_lookups_total` (counter): cache lookups by result
//!   (`hit`, `miss`)
//! - `dispatch_cache_entries` (gauge): keys held by the resolution cache

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(outcome: &'static str) {
    counter!("dispatch_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("dispatch_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("dispatch_cache_entries").set(entries as f64);
}
