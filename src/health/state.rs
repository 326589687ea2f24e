//! Worker health state machine.
//!
//! # States
//! - Active: worker receives traffic
//! - Deactivated: worker kept registered but excluded from selection
//! - Removed: worker unregistered, polling stops (terminal)
//!
//! # State Transitions
//! ```text
//! Active → Active:       probe ok, or failures <= failure_threshold
//! Active → Deactivated:  failures > failure_threshold, deactivations <= max_deactivations
//! Deactivated → Active:  deactivation delay elapsed (failures reset to 0)
//! Active → Removed:      failures > failure_threshold, deactivations > max_deactivations
//! ```
//!
//! A successful probe does not clear the failure streak; only reactivation does.

use crate::config::HealthCheckConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Active,
    Deactivated,
    Removed,
}

/// What the polling loop must do after one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Probe succeeded.
    Healthy,
    /// Probe failed, streak still tolerated.
    Failing { failures: u32 },
    /// Take the worker out of rotation for a while.
    Deactivate,
    /// Unregister the worker for good.
    Remove,
}

impl Transition {
    /// State the worker ends up in once the transition is applied.
    pub fn next_state(self) -> HealthState {
        match self {
            Transition::Healthy | Transition::Failing { .. } => HealthState::Active,
            Transition::Deactivate => HealthState::Deactivated,
            Transition::Remove => HealthState::Removed,
        }
    }
}

/// Thresholds driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub failure_threshold: u32,
    pub max_deactivations: u32,
}

impl HealthPolicy {
    /// Decide the transition after a failed probe.
    ///
    /// `failures` is the streak including this probe, `deactivations` the
    /// lifetime count before this decision.
    pub fn on_failure(&self, failures: u32, deactivations: u32) -> Transition {
        if failures <= self.failure_threshold {
            Transition::Failing { failures }
        } else if deactivations > self.max_deactivations {
            Transition::Remove
        } else {
            Transition::Deactivate
        }
    }
}

impl From<&HealthCheckConfig> for HealthPolicy {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            max_deactivations: config.max_deactivations,
        }
    }
}
