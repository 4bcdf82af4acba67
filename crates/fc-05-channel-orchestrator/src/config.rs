//! Orchestrator configuration with validation.

use fc_03_submission::RetryPolicy;
use serde::{Deserialize, Serialize};
use shared_types::{CallTimeouts, EndorsementPolicy};
use std::time::Duration;
use thiserror::Error;

/// Defaults applied to every facade call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub timeouts: TimeoutConfig,
    /// Orderer retry policy for broadcasts and genesis block fetches.
    pub retry: RetryPolicy,
    /// Wait for a chaincode-ready event after instantiate/upgrade commits.
    pub wait_for_ready: bool,
    /// Policy given to channels created through this client.
    pub default_policy: EndorsementPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            retry: RetryPolicy::default(),
            wait_for_ready: true,
            default_policy: EndorsementPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeouts;
        for (name, value) in [
            ("endorsement_ms", t.endorsement_ms),
            ("ordering_ms", t.ordering_ms),
            ("commit_ms", t.commit_ms),
            ("ready_ms", t.ready_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidTimeout(format!("{name} cannot be 0")));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts cannot be 0".into(),
            ));
        }
        Ok(())
    }

    pub fn call_timeouts(&self) -> CallTimeouts {
        self.timeouts.into()
    }
}

/// Per-phase windows in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub endorsement_ms: u64,
    pub ordering_ms: u64,
    pub commit_ms: u64,
    pub ready_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            endorsement_ms: 30_000,
            ordering_ms: 30_000,
            commit_ms: 30_000,
            ready_ms: 60_000,
        }
    }
}

impl From<TimeoutConfig> for CallTimeouts {
    fn from(t: TimeoutConfig) -> Self {
        Self {
            endorsement: Duration::from_millis(t.endorsement_ms),
            ordering: Duration::from_millis(t.ordering_ms),
            commit: Duration::from_millis(t.commit_ms),
            ready: Duration::from_millis(t.ready_ms),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid retry policy: {0}")]
    InvalidRetry(String),
}
