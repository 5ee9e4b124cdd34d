//! Resilient data gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /api/data
//!     ─────────────▶ http::server ──▶ gateway::ResilientGateway
//!                                        │
//!                                        ├─ cache hit ───────────────▶ 200 (source: cache)
//!                                        │
//!                                        └─ miss ─▶ resilience::CircuitBreaker
//!                                                     │
//!                                                     ├─ ok ─▶ cache.put ─▶ 200 (source: origin)
//!                                                     └─ open / timeout / error ─▶ 200 (source: fallback)
//! ```

use std::path::PathBuf;

use clap::Parser;

use resilient_gateway::config::loader::load_or_default;
use resilient_gateway::lifecycle::{signals::shutdown_signal, startup};
use resilient_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "resilient-gateway", version, about = "Cache-aside gateway with circuit breaker")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    startup::init_observability(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "resilient-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        breaker = %config.breaker.name,
        failure_rate_threshold = config.breaker.failure_rate_threshold,
        sliding_window_size = config.breaker.sliding_window_size,
        data_source = ?config.data_source.kind,
        "Configuration loaded"
    );

    let listener = startup::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
