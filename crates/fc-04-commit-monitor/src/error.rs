//! Error types for the commit monitor.
//!
//! Timeouts are not errors here: an unknown fate is a regular
//! [`CommitStatus::TimedOut`](crate::CommitStatus) outcome.

use shared_types::TxId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitError {
    /// No peer was given to listen on.
    #[error("no event peers for channel {channel}")]
    NoEventPeers { channel: String },

    /// Every subscription attempt failed.
    #[error("could not subscribe to any event source on {channel}: {}", .failures.join("; "))]
    NoEventSource {
        channel: String,
        failures: Vec<String>,
    },

    #[error("wait for {tx_id} cancelled")]
    Cancelled { tx_id: TxId },

    #[error("readiness wait for {chaincode} cancelled")]
    ReadinessCancelled { chaincode: String },
}

/// Result type for commit monitoring.
pub type CommitResult<T> = Result<T, CommitError>;
