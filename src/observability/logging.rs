//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Derive the default filter from the configured log level
//!
//! `RUST_LOG` takes precedence over the configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    format!(
        "worker_gateway={level},tower_http={level}",
        level = config.log_level
    )
}

/// Install the global subscriber. Safe to call once per process.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(config).into());

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
