//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the configuration used when no file is given: defaults plus
/// environment overrides.
pub fn default_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// `HOST` and `PORT` rewrite the listener bind address.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("HOST");
    let port = lookup("PORT");
    if host.is_none() && port.is_none() {
        return;
    }

    let (current_host, current_port) = config
        .listener
        .bind_address
        .rsplit_once(':')
        .map(|(h, p)| (h.to_string(), p.to_string()))
        .unwrap_or_else(|| (config.listener.bind_address.clone(), "3000".to_string()));

    let host = match host {
        Some(h) if h.contains(':') && !h.starts_with('[') => format!("[{}]", h),
        Some(h) => h,
        None => current_host,
    };
    config.listener.bind_address = format!("{}:{}", host, port.unwrap_or(current_port));
}
