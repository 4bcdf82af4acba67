//! # Channel Orchestrator (FC-05)
//!
//! The client facade. Each operation turns one logical action into the
//! submit/confirm protocol:
//!
//! ```text
//! build proposal → collect endorsements → assemble envelope
//!      → open commit watch → broadcast → wait for commit → receipt
//! ```
//!
//! Queries stop after endorsement collection and never reach an orderer.
//!
//! ## Error Taxonomy
//!
//! Every failure is a [`ClientError`]; [`ClientError::kind`] classifies it as
//! one of [`ErrorKind`]'s outcomes. A commit that could not be observed is
//! [`ErrorKind::CommitTimeout`], never success and never failure.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::{ConfigError, OrchestratorConfig, TimeoutConfig};
pub use domain::requests::{
    CreateChannelRequest, DeployRequest, InstallRequest, InvokeRequest, JoinChannelRequest,
    QueryRequest,
};
pub use domain::results::{
    ChannelCreated, DeployReceipt, InstallReceipt, JoinReceipt, PeerAnswer, QueryResponses,
    TxReceipt,
};
pub use error::{ClientError, ClientResult, ErrorKind};
pub use ports::inbound::ChannelApi;
pub use service::ChannelOrchestrator;
