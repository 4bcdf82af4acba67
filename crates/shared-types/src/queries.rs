//! Typed payloads returned by system-chaincode queries.
//!
//! Peers encode these with the canonical codec; the orchestrator decodes them
//! at the boundary so a malformed answer surfaces as an error there instead of
//! as a surprise downstream.

use crate::entities::Hash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInfo {
    pub name: String,
    pub version: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InstalledChaincodes {
    pub chaincodes: Vec<ChaincodeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JoinedChannels {
    pub channels: Vec<String>,
}

/// Ledger height and tip hashes of one channel as seen by one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub height: u64,
    pub current_block_hash: Hash,
    pub previous_block_hash: Hash,
}

/// Latest configuration block of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel: String,
    pub sequence: u64,
    pub orderers: Vec<String>,
    pub organizations: Vec<String>,
    pub raw: Vec<u8>,
}
