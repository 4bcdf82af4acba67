//! # Network Sim
//!
//! In-process stand-ins for peers and orderers. A [`SimNetwork`] implements
//! every outbound port of the channel client, keeps a ledger per channel and
//! runs chaincode against it, so full flows (create, join, install,
//! instantiate, invoke, query) can be exercised without a real network.
//!
//! ## Fault injection
//!
//! | Fault | Peer | Orderer |
//! |-------|------|---------|
//! | `Unreachable` | transport error | transport error |
//! | `Reject` | response with the given status | refusal ack |
//! | `Delay` | answers late | answers late |
//! | `Hang` | never answers | never answers |
//! | `Diverge` | foreign result digest, signed | no effect |
//! | `Impersonate` | answers under another peer's name | no effect |
//!
//! A peer taken down with [`FaultInjector::take_down`] also refuses event
//! subscriptions and does not announce commits.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod chaincode;
pub mod error;
pub mod faults;
pub mod ledger;
pub mod network;
pub mod orderer;
pub mod peer;
pub mod topology;

pub use chaincode::{Chaincode, ExampleChaincode, KeyValueChaincode, TxContext};
pub use error::{SimError, SimResult};
pub use faults::{Fault, FaultInjector};
pub use network::{BroadcastRecord, SimConfig, SimNetwork};
pub use peer::STATUS_EXECUTION_ERROR;
pub use topology::two_org_registry;
