//! # Ledger Events
//!
//! Events peers emit after committing blocks or finishing chaincode
//! deployment, and the filters used to pick them out of the bus.

use serde::{Deserialize, Serialize};
use shared_types::{TxId, ValidationCode};

/// Validation result of one transaction inside a committed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxValidation {
    pub tx_id: TxId,
    pub code: ValidationCode,
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A peer appended a block to its copy of a channel ledger.
    BlockCommitted {
        channel: String,
        /// Peer that observed the commit.
        peer: String,
        block_number: u64,
        transactions: Vec<TxValidation>,
    },

    /// A chaincode container finished starting on a peer and can serve
    /// invocations.
    ChaincodeReady {
        channel: String,
        peer: String,
        chaincode: String,
        version: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockCommitted { .. } => EventTopic::Blocks,
            Self::ChaincodeReady { .. } => EventTopic::Chaincode,
        }
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            Self::BlockCommitted { channel, .. } | Self::ChaincodeReady { channel, .. } => channel,
        }
    }

    /// Peer that emitted the event.
    #[must_use]
    pub fn peer(&self) -> &str {
        match self {
            Self::BlockCommitted { peer, .. } | Self::ChaincodeReady { peer, .. } => peer,
        }
    }

    /// Validation code of `tx_id` if this is a block containing it.
    #[must_use]
    pub fn validation_of(&self, tx_id: &TxId) -> Option<ValidationCode> {
        match self {
            Self::BlockCommitted { transactions, .. } => transactions
                .iter()
                .find(|t| &t.tx_id == tx_id)
                .map(|t| t.code),
            Self::ChaincodeReady { .. } => None,
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Block commit events.
    Blocks,
    /// Chaincode lifecycle events.
    Chaincode,
    /// All events.
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to subscribe to (empty = all).
    pub topics: Vec<EventTopic>,
    pub channel: Option<String>,
    pub peer: Option<String>,
    /// Only blocks containing this transaction.
    pub tx_id: Option<TxId>,
    /// Only readiness of this chaincode.
    pub chaincode: Option<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self {
            topics: vec![EventTopic::All],
            ..Self::default()
        }
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            ..Self::default()
        }
    }

    /// Blocks on `channel` that contain `tx_id`.
    #[must_use]
    pub fn transaction(channel: &str, tx_id: &TxId) -> Self {
        Self {
            topics: vec![EventTopic::Blocks],
            channel: Some(channel.to_string()),
            tx_id: Some(tx_id.clone()),
            ..Self::default()
        }
    }

    /// Readiness of `chaincode` on `channel`.
    #[must_use]
    pub fn chaincode_ready(channel: &str, chaincode: &str) -> Self {
        Self {
            topics: vec![EventTopic::Chaincode],
            channel: Some(channel.to_string()),
            chaincode: Some(chaincode.to_string()),
            ..Self::default()
        }
    }

    /// Restrict to events emitted by one peer.
    #[must_use]
    pub fn from_peer(mut self, peer: &str) -> Self {
        self.peer = Some(peer.to_string());
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let channel_match = self.channel.as_deref().map_or(true, |c| c == event.channel());
        let peer_match = self.peer.as_deref().map_or(true, |p| p == event.peer());

        let tx_match = self
            .tx_id
            .as_ref()
            .map_or(true, |tx| event.validation_of(tx).is_some());

        let chaincode_match = match (&self.chaincode, event) {
            (None, _) => true,
            (Some(name), LedgerEvent::ChaincodeReady { chaincode, .. }) => name == chaincode,
            (Some(_), LedgerEvent::BlockCommitted { .. }) => false,
        };

        topic_match && channel_match && peer_match && tx_match && chaincode_match
    }
}
