//! Collection request and result types.

use shared_types::{EndorsementPolicy, EndorsementResponse, Hash, PeerEndpoint, SignedProposal, TransportError, TxId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// When the collector may stop listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionMode {
    /// Resolve as soon as the policy is satisfied.
    #[default]
    Quorum,
    /// Wait for every target, then evaluate the policy.
    All,
}

/// One fan-out.
#[derive(Debug, Clone)]
pub struct EndorsementRequest {
    pub proposal: Arc<SignedProposal>,
    pub targets: Vec<PeerEndpoint>,
    pub policy: EndorsementPolicy,
    pub mode: CollectionMode,
    /// Require identical result digests across accepted responses. Disabled
    /// only for per-peer introspection queries whose answers legitimately
    /// differ between peers.
    pub check_consistency: bool,
}

impl EndorsementRequest {
    /// Targets named more than once are asked once.
    pub fn new(proposal: Arc<SignedProposal>, targets: Vec<PeerEndpoint>, policy: EndorsementPolicy) -> Self {
        Self {
            proposal,
            targets: distinct_targets(targets),
            policy,
            mode: CollectionMode::Quorum,
            check_consistency: true,
        }
    }

    pub fn with_mode(mut self, mode: CollectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn without_consistency_check(mut self) -> Self {
        self.check_consistency = false;
        self
    }
}

/// Drop repeated peers, keeping the first occurrence.
pub(crate) fn distinct_targets(targets: Vec<PeerEndpoint>) -> Vec<PeerEndpoint> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|p| seen.insert(p.name.clone()))
        .collect()
}

/// Why a single peer did not contribute an endorsement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Transport(TransportError),
    /// The peer executed the proposal and returned an error status.
    Rejected { status: i32, message: String },
    /// The response does not belong to the proposal, or to the peer it was
    /// sent to.
    ForeignResponse { detail: String },
    /// The endorsement is not signed by the targeted peer's identity.
    InvalidSignature { detail: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::Rejected { status, message } => write!(f, "status {status}: {message}"),
            Self::ForeignResponse { detail } => write!(f, "foreign response: {detail}"),
            Self::InvalidSignature { detail } => write!(f, "invalid endorsement: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub peer: String,
    pub org: String,
    pub reason: FailureReason,
}

impl fmt::Display for PeerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.peer, self.reason)
    }
}

/// Accepted endorsements and the peers that failed along the way.
#[derive(Debug, Clone)]
pub struct EndorsementSet {
    pub tx_id: TxId,
    /// In arrival order.
    pub accepted: Vec<EndorsementResponse>,
    /// Failures absorbed while the policy could still be met.
    pub failed: Vec<PeerFailure>,
    /// Target peers that had not answered when the set resolved.
    pub unanswered: Vec<String>,
}

impl EndorsementSet {
    /// Digest shared by every accepted response, when consistency was
    /// enforced.
    pub fn result_digest(&self) -> Option<Hash> {
        self.accepted.first().map(|r| r.result_digest)
    }

    /// Payload of the first accepted response.
    pub fn payload(&self) -> Option<&[u8]> {
        self.accepted.first().map(|r| r.payload.as_slice())
    }

    pub fn endorsers(&self) -> impl Iterator<Item = &str> {
        self.accepted.iter().map(|r| r.peer.as_str())
    }
}
