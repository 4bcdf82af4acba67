//! Error types for the transaction submitter.

use shared_types::{BroadcastStatus, CodecError, IdentityError, TxId};
use std::fmt;
use thiserror::Error;

/// One attempt that did not reach a working orderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub attempt: u32,
    pub orderer: String,
    pub reason: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.attempt, self.orderer, self.reason)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no orderers configured for transaction {tx_id}")]
    NoOrderers { tx_id: TxId },

    #[error("transaction {tx_id} has no endorsements to assemble")]
    NoEndorsements { tx_id: TxId },

    #[error("endorsements for {tx_id} disagree: {first_peer} vs {peer}")]
    InconsistentEndorsements {
        tx_id: TxId,
        first_peer: String,
        peer: String,
    },

    #[error("envelope signer is not the creator of proposal {tx_id}")]
    CreatorMismatch { tx_id: TxId },

    /// Every attempt failed to reach an orderer.
    #[error("no orderer reachable for {tx_id} after {} attempts: {}", .attempts.len(), join(.attempts))]
    OrderingUnavailable {
        tx_id: TxId,
        attempts: Vec<AttemptFailure>,
    },

    /// An orderer refused the envelope. Never retried.
    #[error("orderer {orderer} rejected {tx_id}: {status:?} {info}")]
    Rejected {
        tx_id: TxId,
        orderer: String,
        status: BroadcastStatus,
        info: String,
    },

    #[error("submission of {tx_id} cancelled")]
    Cancelled { tx_id: TxId },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

fn join(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for submission operations.
pub type SubmissionResult<T> = Result<T, SubmissionError>;
