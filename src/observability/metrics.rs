//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway, breaker and discovery metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_fetch_total` (counter): fetches by source (cache, origin, fallback)
//! - `gateway_cache_lookups_total` (counter): cache hits, misses, errors
//! - `breaker_calls_total` (counter): calls by breaker and outcome
//! - `breaker_transitions_total` (counter): phase changes
//! - `breaker_phase` (gauge): 0=closed, 1=half_open, 2=open
//! - `discovery_resolutions_total` (counter): resolutions by service and result
//! - `http_requests_total` / `http_request_duration_seconds`: inbound traffic
//!
//! # Design Decisions
//! - Facade calls are no-ops until a recorder is installed, so tests need no setup
//! - Labels are low-cardinality (no cache keys, no instance addresses)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::Phase;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_fetch(source: &'static str) {
    ::metrics::counter!("gateway_fetch_total", "source" => source).increment(1);
}

pub fn record_cache_lookup(result: &'static str) {
    ::metrics::counter!("gateway_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_breaker_call(breaker: &str, outcome: &'static str) {
    ::metrics::counter!(
        "breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_breaker_transition(breaker: &str, from: Phase, to: Phase) {
    ::metrics::counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_phase(breaker, to);
}

pub fn record_breaker_phase(breaker: &str, phase: Phase) {
    let value = match phase {
        Phase::Closed => 0.0,
        Phase::HalfOpen => 1.0,
        Phase::Open => 2.0,
    };
    ::metrics::gauge!("breaker_phase", "breaker" => breaker.to_string()).set(value);
}

pub fn record_resolution(service: &str, result: &'static str) {
    ::metrics::counter!(
        "discovery_resolutions_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_request(method: &str, path: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("http_request_duration_seconds", "path" => path)
        .record(start.elapsed().as_secs_f64());
}
