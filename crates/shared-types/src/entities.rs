//! # Core Domain Entities
//!
//! Identifiers, chaincode descriptors and ledger-facing value types.
//!
//! ## Clusters
//!
//! - **Identity of a call**: [`TxId`], [`Role`]
//! - **What is invoked**: [`ChaincodeSpec`], [`Invocation`], [`ProposalKind`]
//! - **What the ledger says**: [`ValidationCode`]

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Well-known system chaincode names and their functions.
pub mod system_chaincode {
    /// Lifecycle system chaincode (install / deploy / upgrade / installed list).
    pub const LIFECYCLE: &str = "lscc";
    /// Configuration system chaincode (join / joined channels / config block).
    pub const CONFIG: &str = "cscc";
    /// Ledger query system chaincode (chain info).
    pub const QUERY: &str = "qscc";

    pub const FCN_INSTALL: &str = "install";
    pub const FCN_DEPLOY: &str = "deploy";
    pub const FCN_UPGRADE: &str = "upgrade";
    pub const FCN_INSTALLED: &str = "getinstalledchaincodes";
    pub const FCN_JOIN_CHAIN: &str = "JoinChain";
    pub const FCN_GET_CHANNELS: &str = "GetChannels";
    pub const FCN_GET_CONFIG_BLOCK: &str = "GetConfigBlock";
    pub const FCN_GET_CHAIN_INFO: &str = "GetChainInfo";
}

/// Transaction identifier.
///
/// Lowercase hex of `SHA-256(nonce || serialized creator)`. Every copy of a
/// proposal sent to different peers carries the same value, which is what
/// lets a later block event be correlated back to the call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(String);

impl TxId {
    /// Build from a raw digest.
    pub fn from_digest(digest: &Hash) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of a requestor within its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Chaincode source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeLanguage {
    #[default]
    Golang,
    Node,
    Java,
}

/// A deployable chaincode unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChaincodeSpec {
    pub name: String,
    pub version: String,
    /// Import path of the chaincode source (e.g. `github.com/example_cc`).
    pub path: String,
    pub language: ChaincodeLanguage,
}

impl ChaincodeSpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

/// Invocation descriptor: which chaincode, which function, which arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Invocation {
    pub chaincode: String,
    pub version: Option<String>,
    pub fcn: String,
    pub args: Vec<Vec<u8>>,
}

impl Invocation {
    pub fn new(chaincode: impl Into<String>, fcn: impl Into<String>) -> Self {
        Self {
            chaincode: chaincode.into(),
            version: None,
            fcn: fcn.into(),
            args: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        self
    }

    pub fn push_arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(arg.as_ref().to_vec());
        self
    }

    /// Arguments rendered lossily as UTF-8, for logs.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect()
    }
}

/// What a proposal asks the peers to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalKind {
    JoinChannel,
    Install,
    Instantiate,
    Upgrade,
    Invoke,
    Query,
    SystemQuery,
}

impl ProposalKind {
    /// Whether the proposal results in a ledger write (needs ordering + commit).
    pub fn is_ledger_write(self) -> bool {
        matches!(self, Self::Instantiate | Self::Upgrade | Self::Invoke)
    }

    /// Whether the proposal must be scoped to a channel.
    pub fn requires_channel(self) -> bool {
        matches!(
            self,
            Self::Instantiate | Self::Upgrade | Self::Invoke | Self::Query
        )
    }

    /// Whether the invocation must name a user chaincode.
    pub fn requires_chaincode_name(self) -> bool {
        matches!(
            self,
            Self::Install | Self::Instantiate | Self::Upgrade | Self::Invoke | Self::Query
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoinChannel => "join_channel",
            Self::Install => "install",
            Self::Instantiate => "instantiate",
            Self::Upgrade => "upgrade",
            Self::Invoke => "invoke",
            Self::Query => "query",
            Self::SystemQuery => "system_query",
        }
    }
}

/// Validation code a committing peer assigns to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    Valid,
    BadPayload,
    BadCreatorSignature,
    DuplicateTxid,
    EndorsementPolicyFailure,
    MvccReadConflict,
    PhantomReadConflict,
    InvalidOtherReason,
}

impl ValidationCode {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::BadPayload => "BAD_PAYLOAD",
            Self::BadCreatorSignature => "BAD_CREATOR_SIGNATURE",
            Self::DuplicateTxid => "DUPLICATE_TXID",
            Self::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            Self::MvccReadConflict => "MVCC_READ_CONFLICT",
            Self::PhantomReadConflict => "PHANTOM_READ_CONFLICT",
            Self::InvalidOtherReason => "INVALID_OTHER_REASON",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
