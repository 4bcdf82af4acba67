//! Runtime settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown scenario '{0}' (expected 'full' or 'query-only')")]
    UnknownScenario(String),

    #[error("{var} must be a number of milliseconds, got '{value}'")]
    InvalidMillis { var: &'static str, value: String },
}

/// Which walkthrough the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    /// Create, join, install, instantiate, invoke and query from scratch.
    #[default]
    Full,
    /// Run against a channel that already exists with `example_cc` deployed.
    QueryOnly,
}

impl FromStr for Scenario {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "query-only" | "query_only" | "query" => Ok(Self::QueryOnly),
            other => Err(SettingsError::UnknownScenario(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeSettings {
    /// Profile to load; the built-in sample network when unset.
    pub profile_path: Option<PathBuf>,
    pub scenario: Scenario,
    /// Overrides the profile's commit window.
    pub commit_timeout: Option<Duration>,
    /// Simulated block cut delay.
    pub block_delay: Option<Duration>,
}

impl RuntimeSettings {
    /// # Environment Variables
    ///
    /// - `FC_NETWORK_PROFILE`: path of a JSON network profile
    /// - `FC_SCENARIO`: `full` (default) or `query-only`
    /// - `FC_COMMIT_TIMEOUT_MS`: commit window override
    /// - `FC_BLOCK_DELAY_MS`: simulated orderer block delay
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let millis = |name: &'static str| -> Result<Option<Duration>, SettingsError> {
            var(name)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map(Duration::from_millis)
                        .map_err(|_| SettingsError::InvalidMillis { var: name, value })
                })
                .transpose()
        };

        Ok(Self {
            profile_path: var("FC_NETWORK_PROFILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            scenario: var("FC_SCENARIO")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
            commit_timeout: millis("FC_COMMIT_TIMEOUT_MS")?,
            block_delay: millis("FC_BLOCK_DELAY_MS")?,
        })
    }
}
