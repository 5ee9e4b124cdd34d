//! Logs and metrics for both services.
//!
//! `logging` installs the `tracing` subscriber (pretty or JSON, filtered by
//! `RUST_LOG` or the configured level). `metrics` names every counter and
//! gauge the gateway emits and installs the Prometheus exporter on demand.
//! Until an exporter is installed, metric calls are no-ops.

pub mod logging;
pub mod metrics;
