//! # Shared Types Crate
//!
//! Domain entities, wire envelopes, the endpoint registry and the identity
//! port shared by the proposal, endorsement, submission, commit and
//! orchestration crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here.
//! - **Canonical Bytes**: anything that gets signed is serialized through
//!   [`envelope::to_canonical_bytes`] so signer and verifier agree on the bytes.
//! - **Read-only Sharing**: `Channel` and identities are shared across
//!   concurrent calls; nothing in this crate holds per-call mutable state.

pub mod context;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod identity;
pub mod policy;
pub mod queries;
pub mod registry;

pub use context::{cancel_pair, CallContext, CallTimeouts, CancelHandle, CancelSignal};
pub use entities::*;
pub use envelope::{
    from_canonical_bytes, to_canonical_bytes, BroadcastAck, BroadcastStatus, ChannelHeader,
    ConfigUpdate, Endorsement, EndorsementResponse, Envelope, EnvelopePayload, GenesisBlock,
    HeaderKind, Proposal, SeekRange, SignatureHeader, SignedProposal, TransactionPayload,
};
pub use errors::*;
pub use identity::{IdentityDescriptor, IdentityProvider, SigningIdentity};
pub use policy::EndorsementPolicy;
pub use queries::{ChainInfo, ChaincodeInfo, ChannelConfig, InstalledChaincodes, JoinedChannels};
pub use registry::{Channel, EndpointRegistry, OrdererEndpoint, Organization, PeerEndpoint, PeerRoles};
