//! # Endorsement Collector (FC-02)
//!
//! Sends one signed proposal to every target peer at once and decides, as
//! responses arrive, whether the channel's endorsement policy is met.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): policy evaluation and collection state
//! - **Ports Layer** (`ports/`): `EndorsementApi` (driving), `PeerGateway` and
//!   `EndorsementVerifier` (driven)
//! - **Adapters Layer** (`adapters/`): `PeerKeyring`
//! - **Service Layer** (`service.rs`): the fan-out loop
//!
//! ## Resolution Rules
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Policy met by accepted responses (quorum mode) | `Ok`, stragglers dropped |
//! | Every target answered (all mode) and policy met | `Ok` with every response |
//! | Response names another peer, or its signature does not verify against the targeted peer | that peer counts as failed |
//! | Two accepted responses with different result digests | `ResultMismatch` |
//! | Remaining peers can no longer meet the policy | `Failure` listing failed peers |
//! | Window elapsed first | `Timeout` |
//! | Caller cancelled | `Cancelled`, in-flight requests dropped |

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::keyring::PeerKeyring;
pub use domain::entities::{
    CollectionMode, EndorsementRequest, EndorsementSet, FailureReason, PeerFailure,
};
pub use domain::policy::PolicyEvaluator;
pub use error::{EndorsementError, EndorsementResult};
pub use ports::inbound::EndorsementApi;
pub use ports::outbound::{EndorsementVerifier, PeerGateway};
pub use service::EndorsementService;
