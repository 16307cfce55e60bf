//! echostat - TCP echo server with in-band connection statistics
//!
//! This is the main entry point for the server.
//! It sets up logging, binds the listener and serves clients until Ctrl+C.

use anyhow::Context;
use echostat::config::Config;
use echostat::server::Server;
use echostat::stats::StatsRegistry;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments and environment
    let config = Config::from_args();

    // Set up logging; RUST_LOG takes precedence over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        version = echostat::VERSION,
        host = %config.host,
        port = config.port,
        max_clients = ?config.max_clients,
        "Starting echostat"
    );

    // Create the registry (shared across all connections)
    let registry = Arc::new(StatsRegistry::new());

    // Bind the TCP listener
    let server = Server::bind(&config, Arc::clone(&registry))
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", server.local_addr()?);

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    server.run_until(shutdown).await;

    let totals = registry.totals();
    info!(
        open_connections = registry.len(),
        connections_accepted = totals.connections_accepted,
        messages_echoed = totals.messages_echoed,
        protocol_violations = totals.protocol_violations,
        "Server shutdown complete"
    );
    Ok(())
}
