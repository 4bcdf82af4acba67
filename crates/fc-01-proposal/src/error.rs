//! Error types for the proposal builder.

use shared_types::{CodecError, IdentityError, ProposalKind};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProposalError {
    /// A field the proposal kind depends on is empty.
    #[error("{kind:?} request is missing {field}")]
    MissingField {
        kind: ProposalKind,
        field: &'static str,
    },

    /// A channel-scoped envelope was requested without a channel.
    #[error("channel name is required")]
    MissingChannel,

    /// The requestor has no private key attached.
    #[error("requestor {name}@{org} cannot sign")]
    NoSigningCapability { name: String, org: String },

    #[error(transparent)]
    Signing(#[from] IdentityError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result type for proposal building.
pub type ProposalResult<T> = Result<T, ProposalError>;
