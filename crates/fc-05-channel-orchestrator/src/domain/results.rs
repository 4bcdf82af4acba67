//! Typed operation results.

use fc_04_commit_monitor::ReadinessOutcome;
use shared_types::{EndorsementResponse, TxId, ValidationCode};

/// A ledger write that reached a block as valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_id: TxId,
    pub channel: String,
    pub block_number: u64,
    pub validation_code: ValidationCode,
    /// Orderer that accepted the envelope.
    pub orderer: String,
    pub broadcast_attempts: u32,
    /// Peers whose endorsements went into the transaction.
    pub endorsers: Vec<String>,
    /// Chaincode response payload of the endorsed simulation.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    pub receipt: TxReceipt,
    /// `None` when readiness was not awaited.
    pub readiness: Option<ReadinessOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCreated {
    pub channel: String,
    pub tx_id: TxId,
    pub orderer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinReceipt {
    pub channel: String,
    pub tx_id: TxId,
    pub joined: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    pub tx_id: TxId,
    pub chaincode: String,
    pub version: String,
    pub installed_on: Vec<String>,
}

/// One peer's answer to a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAnswer<T> {
    pub peer: String,
    pub org: String,
    pub value: T,
}

/// Every requested peer's answer to a read-only call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponses<T> {
    pub tx_id: TxId,
    /// In arrival order.
    pub answers: Vec<PeerAnswer<T>>,
}

impl<T> QueryResponses<T> {
    pub fn first(&self) -> Option<&T> {
        self.answers.first().map(|a| &a.value)
    }

    pub fn for_peer(&self, peer: &str) -> Option<&T> {
        self.answers.iter().find(|a| a.peer == peer).map(|a| &a.value)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl QueryResponses<Vec<u8>> {
    pub(crate) fn raw(tx_id: TxId, responses: Vec<EndorsementResponse>) -> Self {
        Self {
            tx_id,
            answers: responses
                .into_iter()
                .map(|r| PeerAnswer {
                    peer: r.peer,
                    org: r.org,
                    value: r.payload,
                })
                .collect(),
        }
    }
}
