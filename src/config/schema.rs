//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Defaults reproduce the gateway's fixed timing constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the worker gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-worker health polling settings.
    pub health_check: HealthCheckConfig,

    /// Dispatcher timeouts and retry policy.
    pub dispatch: DispatchConfig,

    /// Outbound calls addressed to the workers themselves.
    pub workers: WorkerConfig,

    /// Shutdown coordination.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Spawn a polling loop for each registered worker.
    pub enabled: bool,

    /// Path probed on every worker.
    pub path: String,

    /// Pause between two probes of the same worker, in milliseconds.
    pub interval_ms: u64,

    /// Probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Time a deactivated worker stays out of rotation, in milliseconds.
    pub deactivation_ms: u64,

    /// Extra pause on top of `deactivation_ms` before polling resumes.
    pub resume_delay_ms: u64,

    /// Failed probes tolerated before the worker is deactivated.
    pub failure_threshold: u32,

    /// Deactivations tolerated before the worker is removed for good.
    pub max_deactivations: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/system/health".to_string(),
            interval_ms: 3000,
            timeout_ms: 1000,
            deactivation_ms: 3000,
            resume_delay_ms: 1000,
            failure_threshold: 2,
            max_deactivations: 2,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn deactivation(&self) -> Duration {
        Duration::from_millis(self.deactivation_ms)
    }

    /// How long the polling loop sleeps after deactivating its worker.
    pub fn deactivation_hold(&self) -> Duration {
        Duration::from_millis(self.deactivation_ms + self.resume_delay_ms)
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Timeout for forwarded GET calls in milliseconds.
    pub get_timeout_ms: u64,

    /// Timeout for forwarded POST calls in milliseconds.
    pub post_timeout_ms: u64,

    /// Fixed wait between two attempts against the same worker.
    pub retry_backoff_ms: u64,

    /// Attempts against one worker before falling back to the next.
    pub max_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            get_timeout_ms: 1000,
            post_timeout_ms: 10_000,
            retry_backoff_ms: 300,
            max_attempts: 3,
        }
    }
}

/// Worker notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Path notified on a worker when it leaves the pool.
    pub unregister_path: String,

    /// Unregister notification timeout in milliseconds.
    pub unregister_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            unregister_path: "/system/unregister".to_string(),
            unregister_timeout_ms: 3000,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline after which the process is killed with a non-zero status.
    pub timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
