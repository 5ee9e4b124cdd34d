//! Discovery caller service.
//!
//! Resolves the gateway through the registry on every request and forwards
//! `/api/data` to the chosen instance. With `--config`, edits to the
//! `[[discovery.services]]` entries are picked up without a restart.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use resilient_gateway::config::loader::load_or_default;
use resilient_gateway::config::watcher::ConfigWatcher;
use resilient_gateway::discovery::{DiscoveryClient, StaticRegistry};
use resilient_gateway::lifecycle::{signals::shutdown_signal, startup};
use resilient_gateway::{CallerServer, Shutdown};

#[derive(Parser)]
#[command(name = "client-service", version, about = "Calls the gateway through service discovery")]
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
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        target_service = %config.caller.target_service,
        instances = config.discovery.services.len(),
        strategy = ?config.discovery.strategy,
        "client-service starting"
    );

    let registry = Arc::new(StaticRegistry::new(&config.discovery.services));
    let discovery = Arc::new(DiscoveryClient::from_config(&config.discovery, registry.clone())?);

    let shutdown = Shutdown::new();

    // Keep the watcher alive for the lifetime of the process.
    let _watcher = match args.config.as_deref() {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let registry = registry.clone();
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(next) = updates.recv() => registry.replace(&next.discovery.services),
                        _ = stop.recv() => break,
                        else => break,
                    }
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let listener = startup::bind(&config.caller.bind_address).await?;
    let server = CallerServer::new(
        &config.caller,
        Duration::from_secs(config.timeouts.request_secs),
        discovery,
    );
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
