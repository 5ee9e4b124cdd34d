//! Startup orchestration shared by both binaries.
//!
//! Fail fast: any startup error is returned to `main` and is fatal.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ObservabilityConfig;
use crate::observability::{logging, metrics};

/// Install logging, then the Prometheus exporter when enabled.
pub fn init_observability(config: &ObservabilityConfig) {
    logging::init_logging(config);

    if !config.metrics_enabled {
        return;
    }
    match config.metrics_address.parse::<SocketAddr>() {
        Ok(addr) => metrics::init_metrics(addr),
        Err(e) => tracing::error!(
            metrics_address = %config.metrics_address,
            error = %e,
            "Failed to parse metrics address"
        ),
    }
}

/// Bind the listener last, once everything else is ready.
pub async fn bind(address: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
