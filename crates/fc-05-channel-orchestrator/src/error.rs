//! Client-facing error taxonomy.
//!
//! Every stage error converts into [`ClientError`]; [`ClientError::kind`]
//! folds the detail back onto the small set of outcomes callers branch on.

use fc_01_proposal::ProposalError;
use fc_02_endorsement::{EndorsementError, PeerFailure};
use fc_03_submission::SubmissionError;
use fc_04_commit_monitor::CommitError;
use shared_types::{CodecError, RegistryError, TxId, ValidationCode};
use std::fmt;
use thiserror::Error;

/// Coarse classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected before anything was sent.
    InvalidRequest,
    EndorsementFailure,
    ResultMismatch,
    EndorsementTimeout,
    OrderingUnavailable,
    SubmissionRejected,
    /// Broadcast succeeded but the outcome is unknown.
    CommitTimeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::EndorsementFailure => "endorsement_failure",
            Self::ResultMismatch => "result_mismatch",
            Self::EndorsementTimeout => "endorsement_timeout",
            Self::OrderingUnavailable => "ordering_unavailable",
            Self::SubmissionRejected => "submission_rejected",
            Self::CommitTimeout => "commit_timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("unknown orderer: {0}")]
    UnknownOrderer(String),

    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    Endorsement(#[from] EndorsementError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Commit(CommitError),

    /// No commit subscription could be opened. Nothing was broadcast.
    #[error("no event source reachable on {channel}: {}", .failures.join("; "))]
    EventSourceUnavailable {
        channel: String,
        failures: Vec<String>,
    },

    /// The orderer accepted the transaction but the window closed before
    /// any peer reported it. It may still commit.
    #[error("no commit event for {tx_id} on {channel} within the window")]
    CommitTimeout { tx_id: TxId, channel: String },

    /// The transaction was committed into a block but marked invalid.
    #[error("transaction {tx_id} invalidated in block {block}: {code}")]
    TransactionInvalid {
        tx_id: TxId,
        code: ValidationCode,
        block: u64,
    },

    /// A peer answered with a payload that does not decode as expected.
    #[error("malformed {expected} response from {peer}: {source}")]
    MalformedResponse {
        peer: String,
        expected: &'static str,
        source: CodecError,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_)
            | Self::UnknownChannel(_)
            | Self::UnknownPeer(_)
            | Self::UnknownOrderer(_)
            | Self::Proposal(_) => ErrorKind::InvalidRequest,

            Self::Endorsement(e) => match e {
                EndorsementError::NoTargets { .. } | EndorsementError::PolicyUnsatisfiable { .. } => {
                    ErrorKind::InvalidRequest
                }
                EndorsementError::PolicyNotMet { .. } => ErrorKind::EndorsementFailure,
                EndorsementError::ResultMismatch { .. } => ErrorKind::ResultMismatch,
                EndorsementError::Timeout { .. } => ErrorKind::EndorsementTimeout,
                EndorsementError::Cancelled { .. } => ErrorKind::Cancelled,
            },

            Self::Submission(e) => match e {
                SubmissionError::OrderingUnavailable { .. } => ErrorKind::OrderingUnavailable,
                SubmissionError::Rejected { .. } => ErrorKind::SubmissionRejected,
                SubmissionError::InconsistentEndorsements { .. } => ErrorKind::ResultMismatch,
                SubmissionError::Cancelled { .. } => ErrorKind::Cancelled,
                SubmissionError::NoOrderers { .. }
                | SubmissionError::NoEndorsements { .. }
                | SubmissionError::CreatorMismatch { .. }
                | SubmissionError::Identity(_)
                | SubmissionError::Codec(_) => ErrorKind::InvalidRequest,
            },

            Self::Commit(e) => match e {
                CommitError::Cancelled { .. } | CommitError::ReadinessCancelled { .. } => {
                    ErrorKind::Cancelled
                }
                CommitError::NoEventPeers { .. } => ErrorKind::InvalidRequest,
                CommitError::NoEventSource { .. } => ErrorKind::OrderingUnavailable,
            },
            Self::EventSourceUnavailable { .. } => ErrorKind::OrderingUnavailable,

            Self::CommitTimeout { .. } => ErrorKind::CommitTimeout,
            Self::TransactionInvalid { .. } => ErrorKind::SubmissionRejected,
            Self::MalformedResponse { .. } => ErrorKind::EndorsementFailure,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Peers that failed during endorsement, if the error carries them.
    pub fn failed_peers(&self) -> &[PeerFailure] {
        match self {
            Self::Endorsement(e) => e.failed_peers(),
            _ => &[],
        }
    }

    /// Peers that endorsed before the operation failed.
    pub fn accepted_peers(&self) -> &[String] {
        match self {
            Self::Endorsement(e) => e.accepted_peers(),
            _ => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

impl From<CommitError> for ClientError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::NoEventSource { channel, failures } => {
                Self::EventSourceUnavailable { channel, failures }
            }
            other => Self::Commit(other),
        }
    }
}

impl From<RegistryError> for ClientError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownChannel(name) => Self::UnknownChannel(name),
            RegistryError::UnknownPeer(name) => Self::UnknownPeer(name),
            RegistryError::UnknownOrderer(name) => Self::UnknownOrderer(name),
            RegistryError::UnknownOrganization(name) => {
                Self::InvalidRequest(format!("unknown organization {name}"))
            }
        }
    }
}

/// Result type for facade operations.
pub type ClientResult<T> = Result<T, ClientError>;
