//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts > 0)
//! - Validate address and path shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must start with '/' (got '{value}')")]
    InvalidPath { field: &'static str, value: String },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_bind_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let health = &config.health_check;
    check_path(&mut errors, "health_check.path", &health.path);
    check_positive(&mut errors, "health_check.interval_ms", health.interval_ms);
    check_positive(&mut errors, "health_check.timeout_ms", health.timeout_ms);

    let dispatch = &config.dispatch;
    check_positive(&mut errors, "dispatch.get_timeout_ms", dispatch.get_timeout_ms);
    check_positive(&mut errors, "dispatch.post_timeout_ms", dispatch.post_timeout_ms);
    check_positive(&mut errors, "dispatch.max_attempts", dispatch.max_attempts as u64);

    check_path(&mut errors, "workers.unregister_path", &config.workers.unregister_path);
    check_positive(
        &mut errors,
        "workers.unregister_timeout_ms",
        config.workers.unregister_timeout_ms,
    );
    check_positive(&mut errors, "shutdown.timeout_secs", config.shutdown.timeout_secs);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Accepts a socket address or `host:port`; hostnames are resolved at bind time.
fn check_bind_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_ok() {
        return;
    }
    let valid = value.rsplit_once(':').is_some_and(|(host, port)| {
        !host.is_empty()
            && !host.contains(':')
            && !host.chars().any(char::is_whitespace)
            && port.parse::<u16>().is_ok()
    });
    if !valid {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.dispatch.max_attempts = 0;
        config.health_check.path = "system/health".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::Zero { field: "dispatch.max_attempts" }));
    }

    #[test]
    fn test_bind_address_accepts_hostnames() {
        let mut config = GatewayConfig::default();
        for address in ["localhost:3000", "[::1]:3000", "127.0.0.1:0"] {
            config.listener.bind_address = address.into();
            assert!(validate_config(&config).is_ok(), "{} should be accepted", address);
        }
        for address in ["localhost", ":3000", "::1:3000", "localhost:http"] {
            config.listener.bind_address = address.into();
            assert!(validate_config(&config).is_err(), "{} should be rejected", address);
        }
    }
}
