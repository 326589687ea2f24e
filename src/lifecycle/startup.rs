//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Bind the listener
//!
//! Any startup error is fatal.

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{loader, ConfigError, GatewayConfig};
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid metrics address {0}")]
    MetricsAddress(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the server needs to start serving.
pub struct Prepared {
    pub config: GatewayConfig,
    pub listener: TcpListener,
}

/// Load configuration, initialize observability and bind the listener.
pub async fn prepare(config_path: Option<&Path>) -> Result<Prepared, StartupError> {
    let config = match config_path {
        Some(path) => loader::load_config(path)?,
        None => loader::default_config()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        health_checks = config.health_check.enabled,
        max_attempts = config.dispatch.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    Ok(Prepared { config, listener })
}
