//! # Transaction Submitter (FC-03)
//!
//! Assembles a signed transaction envelope from a satisfied endorsement set
//! and broadcasts it to the channel's orderers.
//!
//! ## Retry Policy
//!
//! ```text
//! attempt 1 → orderer[0] ──unreachable──→ backoff → attempt 2 → orderer[1] → ...
//!                        ──rejected─────→ SubmissionRejected (no retry)
//!                        ──accepted─────→ receipt
//! ```
//!
//! The orderer list is cycled until `max_attempts` is spent. Every attempt
//! carries the very same envelope, hence the same transaction ID. An orderer
//! answering `ServiceUnavailable` or exceeding the per-attempt timeout counts
//! as unreachable.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::assembler::assemble_transaction;
pub use domain::retry::RetryPolicy;
pub use error::{AttemptFailure, SubmissionError, SubmissionResult};
pub use ports::inbound::{SubmissionApi, SubmissionReceipt};
pub use ports::outbound::{DeliverResponse, OrdererGateway};
pub use service::SubmissionService;
