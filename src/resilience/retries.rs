//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is retried
//! - Hold the per-worker attempt budget and the fixed backoff
//!
//! # Design Decisions
//! - Transport errors (connect failure, timeout, no response) are retried
//! - An answer from the worker is final, whatever its status
//! - Backoff is a fixed interval, no jitter

use std::time::Duration;

use crate::config::DispatchConfig;
use crate::dispatch::client::CallError;
use crate::dispatch::operation::WorkerResponse;

/// What to do with the result of one attempt.
#[derive(Debug)]
pub enum AttemptDecision {
    /// Hand this response to the caller.
    Return(WorkerResponse),
    /// Try again after the backoff.
    Retry,
}

/// Per-worker retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn decide(&self, result: Result<WorkerResponse, CallError>) -> AttemptDecision {
        match result {
            Ok(response) => AttemptDecision::Return(response),
            Err(CallError::Application(response)) => AttemptDecision::Return(response),
            Err(CallError::Transport(_)) => AttemptDecision::Retry,
        }
    }
}

impl From<&DispatchConfig> for RetryPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}
