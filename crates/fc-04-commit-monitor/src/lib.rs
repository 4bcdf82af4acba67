//! # Commit Monitor (FC-04)
//!
//! Resolves a broadcast transaction to its ledger fate by listening to block
//! events from one or more peers.
//!
//! ## State Machine
//!
//! ```text
//!            ┌── block event, VALID ──────→ COMMITTED
//! PENDING ───┼── block event, other code ─→ INVALID
//!            └── window elapsed / streams closed → TIMED_OUT (fate unknown)
//! ```
//!
//! Subscriptions are opened with [`CommitMonitorApi::watch`] *before* the
//! envelope is broadcast, and consumed by [`CommitMonitorApi::wait`] after the
//! orderer accepted it, so no commit event can slip between the two.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::state::{CommitOutcome, CommitStatus, CommitTracker, ReadinessOutcome};
pub use error::{CommitError, CommitResult};
pub use ports::inbound::{CommitMonitorApi, CommitWatch, ReadyWatch};
pub use ports::outbound::{LedgerEventSource, LedgerEventStream};
pub use service::CommitMonitorService;
