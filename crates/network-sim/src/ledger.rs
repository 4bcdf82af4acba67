//! Per-channel ledger kept by the simulated network.
//!
//! Every joined peer commits the same blocks, so one ledger per channel
//! stands in for all peer copies. Blocks hold a single transaction.

use crate::chaincode::{ReadWriteSet, WorldState};
use shared_bus::TxValidation;
use shared_crypto::{sha256, sha256_many};
use shared_types::{
    to_canonical_bytes, ChainInfo, ChannelConfig, CodecError, ConfigUpdate, GenesisBlock, Hash,
    ProposalKind, TxId, ValidationCode,
};
use std::collections::{HashMap, HashSet};

/// An endorsed simulation waiting for its block.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub kind: ProposalKind,
    pub chaincode: String,
    pub version: Option<String>,
    pub rwset: ReadWriteSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub number: u64,
    pub hash: Hash,
    pub previous_hash: Hash,
    pub transactions: Vec<TxValidation>,
}

#[derive(Debug)]
pub struct ChannelLedger {
    config: ChannelConfig,
    genesis: GenesisBlock,
    blocks: Vec<BlockRecord>,
    state: WorldState,
    seen: HashSet<TxId>,
    /// Chaincode name to instantiated version.
    instantiated: HashMap<String, String>,
}

impl ChannelLedger {
    /// Build block zero from a channel creation request.
    pub fn create(update: &ConfigUpdate, orderers: Vec<String>) -> Result<Self, CodecError> {
        let config = ChannelConfig {
            channel: update.channel.clone(),
            sequence: 0,
            orderers,
            organizations: update.organizations.clone(),
            raw: update.config_tx.clone(),
        };
        let genesis = GenesisBlock {
            channel: update.channel.clone(),
            data: to_canonical_bytes(&config)?,
        };
        let block_zero = BlockRecord {
            number: 0,
            hash: sha256(&genesis.data),
            previous_hash: [0; 32],
            transactions: Vec::new(),
        };
        Ok(Self {
            config,
            genesis,
            blocks: vec![block_zero],
            state: WorldState::default(),
            seen: HashSet::new(),
            instantiated: HashMap::new(),
        })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn genesis(&self) -> &GenesisBlock {
        &self.genesis
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn chain_info(&self) -> ChainInfo {
        let tip = self.tip();
        ChainInfo {
            height: self.height(),
            current_block_hash: tip.hash,
            previous_block_hash: tip.previous_hash,
        }
    }

    pub fn instantiated_version(&self, chaincode: &str) -> Option<&str> {
        self.instantiated.get(chaincode).map(String::as_str)
    }

    fn tip(&self) -> &BlockRecord {
        // Block zero is created with the ledger and never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Validate `tx_id` against the current state and append it as the next
    /// block. A transaction the network never simulated is a bad payload.
    pub fn commit(&mut self, tx_id: TxId, pending: Option<PendingTx>) -> BlockRecord {
        let code = match &pending {
            _ if self.seen.contains(&tx_id) => ValidationCode::DuplicateTxid,
            None => ValidationCode::BadPayload,
            Some(tx) if !self.state.reads_current(&tx.rwset) => ValidationCode::MvccReadConflict,
            Some(_) => ValidationCode::Valid,
        };

        let number = self.height();
        if code.is_valid() {
            if let Some(tx) = &pending {
                self.state.apply(&tx.rwset, number);
                if matches!(tx.kind, ProposalKind::Instantiate | ProposalKind::Upgrade) {
                    if let Some(version) = &tx.version {
                        self.instantiated.insert(tx.chaincode.clone(), version.clone());
                    }
                }
            }
        }
        self.seen.insert(tx_id.clone());

        let previous_hash = self.tip().hash;
        let hash = sha256_many(&[
            &previous_hash,
            &number.to_be_bytes(),
            tx_id.as_str().as_bytes(),
            code.as_str().as_bytes(),
        ]);
        let block = BlockRecord {
            number,
            hash,
            previous_hash,
            transactions: vec![TxValidation { tx_id, code }],
        };
        self.blocks.push(block.clone());
        block
    }
}
