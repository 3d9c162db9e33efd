//! Admission gate service binary.
//!
//! Wires configuration, logging, metrics, and an in-memory user directory
//! into the gate server. Production deployments embed the library with a
//! `UserDirectory` implementation backed by their own user store; this
//! binary exists to run the gate standalone.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use admission_gate::config::{load_config, GateConfig};
use admission_gate::directory::{InMemoryDirectory, UserDirectory};
use admission_gate::http::GateServer;
use admission_gate::lifecycle::Shutdown;
use admission_gate::observability;

#[derive(Parser)]
#[command(name = "admission-gate", about = "Rate-limiting, authenticating admission gate for a resource API")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    observability::logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        requests_per_second = config.rate_limit.requests_per_second,
        burst_size = config.rate_limit.burst_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The demo binary starts empty; nothing can authenticate until users
    // are registered through the directory.
    let directory: Arc<dyn UserDirectory> = Arc::new(InMemoryDirectory::new());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    });

    let server = GateServer::new(config, directory);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
