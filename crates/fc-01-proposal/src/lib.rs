//! # Proposal Builder (FC-01)
//!
//! Turns a channel name, a requestor identity and an invocation descriptor
//! into a signed proposal with a fresh transaction ID.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): request validation and system chaincode
//!   routing, no I/O
//! - **Ports Layer** (`ports/`): the `ProposalBuilderApi` driving port
//! - **Service Layer** (`service.rs`): nonce generation, encoding and signing
//!
//! ## Guarantees
//!
//! - Transaction IDs are `hex(SHA-256(nonce || creator))` with a 24-byte OS
//!   nonce, so IDs are unpredictable and independent of wall-clock time.
//! - Every copy of one proposal sent to different peers carries the same ID.
//! - A malformed request fails before any nonce is drawn.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::validation::{target_chaincode, validate_request};
pub use error::{ProposalError, ProposalResult};
pub use ports::inbound::ProposalBuilderApi;
pub use service::ProposalBuilder;
