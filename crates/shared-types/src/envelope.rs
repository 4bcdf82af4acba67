//! # Wire Envelopes
//!
//! The signed messages exchanged with peers and orderers.
//!
//! ```text
//! Proposal ──sign──→ SignedProposal ──peers──→ EndorsementResponse (xN)
//!                                                     │
//!                         TransactionPayload ←────────┘
//!                                │
//!                      EnvelopePayload ──sign──→ Envelope ──orderer──→ BroadcastAck
//! ```
//!
//! Signatures always cover the canonical bytes produced by
//! [`to_canonical_bytes`]; the decoded structs ride along only for
//! convenience on the client side.

use crate::entities::{Hash, Invocation, ProposalKind, TxId};
use crate::errors::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Lowest status code a peer uses for an execution error.
pub const STATUS_ERROR_THRESHOLD: i32 = 400;

/// Status code of a successful chaincode execution.
pub const STATUS_OK: i32 = 200;

/// Serialize a value into the bytes that get signed.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode bytes produced by [`to_canonical_bytes`].
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// What kind of message an envelope header introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderKind {
    EndorserTransaction,
    ConfigUpdate,
    DeliverSeek,
}

/// Header common to proposals and envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub kind: HeaderKind,
    /// Empty for channel-less proposals (install, joined-channel queries).
    pub channel: String,
    pub tx_id: TxId,
    /// Seconds since the Unix epoch. Not part of the transaction ID.
    pub timestamp: u64,
}

/// Who created the message and with which nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Canonical bytes of the creator's `IdentityDescriptor`.
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// An unsigned transaction proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub header: ChannelHeader,
    pub signature_header: SignatureHeader,
    pub kind: ProposalKind,
    pub invocation: Invocation,
}

impl Proposal {
    pub fn tx_id(&self) -> &TxId {
        &self.header.tx_id
    }

    pub fn channel(&self) -> &str {
        &self.header.channel
    }
}

/// A proposal together with the creator's signature over its canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal: Proposal,
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedProposal {
    pub fn tx_id(&self) -> &TxId {
        self.proposal.tx_id()
    }
}

/// A peer's signature over the proposal response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Canonical bytes of the endorsing peer's identity.
    pub endorser: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A single peer's answer to a signed proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementResponse {
    pub peer: String,
    pub org: String,
    pub status: i32,
    pub message: String,
    /// Chaincode response payload (the query result for reads).
    pub payload: Vec<u8>,
    /// Hash of the proposal bytes the peer simulated.
    pub payload_hash: Hash,
    /// Digest of the simulated read/write set and response.
    pub result_digest: Hash,
    pub endorsement: Endorsement,
}

impl EndorsementResponse {
    /// `200..400` is success; `>= 400` is an execution error.
    pub fn is_success(&self) -> bool {
        (STATUS_OK..STATUS_ERROR_THRESHOLD).contains(&self.status)
    }
}

/// The endorsed transaction body that goes to ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub proposal_bytes: Vec<u8>,
    pub response_payload: Vec<u8>,
    pub result_digest: Hash,
    pub endorsements: Vec<Endorsement>,
}

/// Everything an envelope signature covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopePayload {
    pub header: ChannelHeader,
    pub signature_header: SignatureHeader,
    pub data: Vec<u8>,
}

/// A signed envelope ready for the orderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: ChannelHeader,
    pub payload_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Envelope {
    pub fn tx_id(&self) -> &TxId {
        &self.header.tx_id
    }

    pub fn channel(&self) -> &str {
        &self.header.channel
    }
}

/// Channel creation request carried inside a `ConfigUpdate` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub channel: String,
    /// Channel profile name (e.g. `TwoOrgsChannel`).
    pub profile: String,
    pub organizations: Vec<String>,
    /// Opaque configuration transaction produced by external tooling.
    pub config_tx: Vec<u8>,
}

/// Block zero of a channel, as delivered by the orderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBlock {
    pub channel: String,
    pub data: Vec<u8>,
}

/// Block range requested from an orderer's deliver service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekRange {
    pub start: u64,
    pub stop: u64,
}

impl SeekRange {
    /// Block zero only.
    pub const GENESIS: Self = Self { start: 0, stop: 0 };
}

/// Orderer verdict on a broadcast envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastStatus {
    Success,
    BadRequest,
    Forbidden,
    NotFound,
    ServiceUnavailable,
    InternalError,
}

/// Acknowledgement of a broadcast. Acceptance does not imply commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAck {
    pub status: BroadcastStatus,
    pub info: String,
}

impl BroadcastAck {
    pub fn success() -> Self {
        Self {
            status: BroadcastStatus::Success,
            info: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BroadcastStatus::Success
    }
}
