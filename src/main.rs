//! Worker gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                WORKER GATEWAY                 │
//!                        │                                               │
//!   /register            │  ┌──────────┐        ┌───────────────────┐    │
//!   /unregister  ────────┼─▶│  http    │───────▶│ load_balancer     │    │
//!   /workers             │  │ handlers │        │ registry + ids    │    │
//!                        │  └────┬─────┘        └─────────┬─────────┘    │
//!                        │       │                        │              │
//!   /balance, /check     │       ▼                        ▼              │
//!   /hello       ────────┼─▶┌──────────┐  select  ┌──────────────┐       │
//!                        │  │ dispatch │─────────▶│ least loaded │       │
//!                        │  │ + retry  │          └──────────────┘       │
//!                        │  └────┬─────┘                                 │
//!                        │       │ HTTP            ┌──────────────┐      │
//!                        │       ▼                 │   health     │      │
//!                        │   workers ◀─── probe ───│   monitors   │      │
//!                        │                         └──────────────┘      │
//!                        └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use worker_gateway::http::GatewayServer;
use worker_gateway::lifecycle::{self, shutdown::spawn_deadline, Shutdown};

#[derive(Parser)]
#[command(name = "worker-gateway")]
#[command(about = "Gateway that balances requests across registered workers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let lifecycle::Prepared { config, listener } = lifecycle::prepare(cli.config.as_deref()).await?;
    tracing::info!("worker-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let deadline = Duration::from_secs(config.shutdown.timeout_secs);
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let signal = lifecycle::wait_for_termination().await;
        tracing::info!(signal, "Received kill signal, shutting down gracefully");
        spawn_deadline(deadline);
        shutdown.trigger();
    });

    let server = GatewayServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
