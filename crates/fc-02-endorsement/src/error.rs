//! Error types for the endorsement collector.

use crate::domain::entities::PeerFailure;
use shared_types::TxId;
use thiserror::Error;

/// Endorsement collector errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndorsementError {
    /// The request named no target peers.
    #[error("no target peers for transaction {tx_id}")]
    NoTargets { tx_id: TxId },

    /// The target set cannot satisfy the policy even if every peer endorses.
    /// Nothing was sent.
    #[error("policy {policy} cannot be satisfied by the targeted peers")]
    PolicyUnsatisfiable { policy: String },

    /// The policy is no longer reachable with the peers still pending.
    #[error("endorsement policy {policy} not met ({} accepted); failed: {}", .accepted.len(), format_failures(.failed))]
    PolicyNotMet {
        policy: String,
        /// Peers whose endorsements were accepted before the policy fell
        /// out of reach.
        accepted: Vec<String>,
        failed: Vec<PeerFailure>,
    },

    /// Two accepted responses simulated different results.
    #[error("result mismatch for {tx_id}: {first_peer} produced {first_digest}, {peer} produced {digest}")]
    ResultMismatch {
        tx_id: TxId,
        first_peer: String,
        first_digest: String,
        peer: String,
        digest: String,
    },

    /// The window elapsed before the policy was decided.
    #[error("endorsement window elapsed with {} accepted; pending: {}", .accepted.len(), .pending.join(", "))]
    Timeout {
        accepted: Vec<String>,
        pending: Vec<String>,
        failed: Vec<PeerFailure>,
    },

    /// The caller cancelled the call.
    #[error("endorsement cancelled with {} peers pending", .pending.len())]
    Cancelled { pending: Vec<String> },
}

impl EndorsementError {
    /// Peers that failed, for errors that carry per-peer detail.
    pub fn failed_peers(&self) -> &[PeerFailure] {
        match self {
            Self::PolicyNotMet { failed, .. } | Self::Timeout { failed, .. } => failed,
            _ => &[],
        }
    }

    /// Peers that endorsed before the collection failed. A peer listed here
    /// has acted on the proposal even though the call as a whole did not
    /// succeed.
    pub fn accepted_peers(&self) -> &[String] {
        match self {
            Self::PolicyNotMet { accepted, .. } | Self::Timeout { accepted, .. } => accepted,
            _ => &[],
        }
    }
}

fn format_failures(failed: &[PeerFailure]) -> String {
    if failed.is_empty() {
        return "none".to_string();
    }
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for endorsement collection.
pub type EndorsementResult<T> = Result<T, EndorsementError>;
