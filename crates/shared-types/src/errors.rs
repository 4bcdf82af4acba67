//! # Error Types
//!
//! Errors raised at the boundary with external collaborators (transport,
//! identity, encoding) and by registry lookups. Stage-specific errors live in
//! their own crates.

use thiserror::Error;

/// A failed exchange with a remote peer or orderer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint could not be reached (connection refused, DNS, reset).
    #[error("endpoint {endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// The endpoint did not answer within the allotted time.
    #[error("endpoint {endpoint} timed out")]
    Timeout { endpoint: String },

    /// A stream or connection was closed by the remote side.
    #[error("endpoint {endpoint} closed the connection")]
    Closed { endpoint: String },
}

impl TransportError {
    pub fn unreachable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Unreachable { endpoint, .. }
            | Self::Timeout { endpoint }
            | Self::Closed { endpoint } => endpoint,
        }
    }
}

/// Signing identity failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The identity has no private key attached.
    #[error("identity {name}@{org} has no signing capability")]
    NoSigningKey { name: String, org: String },

    /// The signer refused or failed to produce a signature.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Canonical encoding failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Endpoint registry lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("unknown orderer: {0}")]
    UnknownOrderer(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("unknown organization: {0}")]
    UnknownOrganization(String),
}
