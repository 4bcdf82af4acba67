//! Commit state machine.
//!
//! Deterministic: the tracker only moves out of `Pending` once, and every
//! later observation is ignored.

use shared_bus::LedgerEvent;
use shared_types::{TxId, ValidationCode};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitStatus {
    Pending,
    Committed,
    Invalid,
    /// No verdict observed within the window. The transaction may still
    /// commit later.
    TimedOut,
}

impl CommitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Committed => "COMMITTED",
            Self::Invalid => "INVALID",
            Self::TimedOut => "TIMED_OUT",
        }
    }

    pub fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fate of one submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub tx_id: TxId,
    pub status: CommitStatus,
    pub block_number: Option<u64>,
    pub validation_code: Option<ValidationCode>,
    /// Peer whose event decided the outcome.
    pub peer: Option<String>,
}

impl CommitOutcome {
    fn undecided(tx_id: TxId, status: CommitStatus) -> Self {
        Self {
            tx_id,
            status,
            block_number: None,
            validation_code: None,
            peer: None,
        }
    }
}

/// Tracks one transaction from `Pending` to a final status.
#[derive(Debug, Clone)]
pub struct CommitTracker {
    channel: String,
    outcome: CommitOutcome,
}

impl CommitTracker {
    pub fn new(channel: impl Into<String>, tx_id: TxId) -> Self {
        Self {
            channel: channel.into(),
            outcome: CommitOutcome::undecided(tx_id, CommitStatus::Pending),
        }
    }

    pub fn status(&self) -> CommitStatus {
        self.outcome.status
    }

    pub fn tx_id(&self) -> &TxId {
        &self.outcome.tx_id
    }

    /// Feed one event. Returns the outcome the first time it becomes final.
    pub fn observe(&mut self, event: &LedgerEvent) -> Option<CommitOutcome> {
        if self.outcome.status.is_final() || event.channel() != self.channel {
            return None;
        }
        let LedgerEvent::BlockCommitted {
            peer, block_number, ..
        } = event
        else {
            return None;
        };
        let code = event.validation_of(&self.outcome.tx_id)?;

        self.outcome.status = if code.is_valid() {
            CommitStatus::Committed
        } else {
            CommitStatus::Invalid
        };
        self.outcome.block_number = Some(*block_number);
        self.outcome.validation_code = Some(code);
        self.outcome.peer = Some(peer.clone());
        Some(self.outcome.clone())
    }

    /// Give up waiting. A final outcome is returned unchanged.
    pub fn expire(&mut self) -> CommitOutcome {
        if !self.outcome.status.is_final() {
            self.outcome.status = CommitStatus::TimedOut;
        }
        self.outcome.clone()
    }
}

/// Result of waiting for a chaincode to become ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready { peer: String, version: String },
    /// No ready event within the window. Deployment may still complete.
    TimedOut,
}
