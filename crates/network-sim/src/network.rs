//! # Simulated Network
//!
//! One shared state behind a lock, one event bus, one fault table. Peer and
//! orderer behavior lives in [`crate::peer`] and [`crate::orderer`]; this
//! module owns construction, bootstrap shortcuts and inspection.
//!
//! ```text
//! client ──process_proposal──→ peers ──simulate──→ pending rwsets
//! client ──broadcast──────────→ orderer ──cut_block──→ ledger ──→ event bus
//! client ←─subscribe────────── peers ←──────────────────────────────┘
//! ```

use crate::chaincode::{Chaincode, ExampleChaincode, KeyValueChaincode, TxContext};
use crate::error::{SimError, SimResult};
use crate::faults::FaultInjector;
use crate::ledger::{ChannelLedger, PendingTx};
use fc_02_endorsement::PeerKeyring;
use parking_lot::{Mutex, RwLock};
use shared_bus::InMemoryEventBus;
use shared_crypto::{sha256_many, verify_signature, LocalSigningIdentity};
use shared_types::{
    from_canonical_bytes, ChaincodeInfo, ConfigUpdate, EndpointRegistry, IdentityDescriptor,
    OrdererEndpoint, PeerEndpoint, ProposalKind, Role, SigningIdentity, TxId,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timing of the simulated ordering service and chaincode containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Pause between accepting a transaction and committing its block.
    pub block_delay: Duration,
    /// Pause between committing an instantiate and the chaincode being ready.
    pub ready_delay: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            block_delay: Duration::from_millis(20),
            ready_delay: Duration::from_millis(50),
        }
    }
}

/// One broadcast attempt as seen by an orderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRecord {
    pub orderer: String,
    pub tx_id: TxId,
    /// Whether the request got past the transport.
    pub reached: bool,
}

pub(crate) struct SimPeer {
    pub(crate) endpoint: PeerEndpoint,
    pub(crate) identity: LocalSigningIdentity,
    pub(crate) channels: BTreeSet<String>,
    pub(crate) installed: Vec<ChaincodeInfo>,
}

impl SimPeer {
    pub(crate) fn has_installed(&self, name: &str, version: &str) -> bool {
        self.installed
            .iter()
            .any(|c| c.name == name && c.version == version)
    }
}

#[derive(Default)]
pub(crate) struct NetworkState {
    pub(crate) peers: BTreeMap<String, SimPeer>,
    pub(crate) orderers: BTreeMap<String, OrdererEndpoint>,
    pub(crate) ledgers: HashMap<String, ChannelLedger>,
    /// Endorsed simulations keyed by transaction, consumed at commit.
    pub(crate) pending: HashMap<TxId, PendingTx>,
}

pub(crate) struct Inner {
    pub(crate) config: SimConfig,
    pub(crate) state: RwLock<NetworkState>,
    chaincodes: RwLock<HashMap<String, Arc<dyn Chaincode>>>,
    pub(crate) bus: InMemoryEventBus,
    pub(crate) faults: FaultInjector,
    pub(crate) broadcasts: Mutex<Vec<BroadcastRecord>>,
    pub(crate) proposals_received: AtomicU64,
    pub(crate) blocks_cut: AtomicU64,
}

/// In-process peers and orderers.
///
/// Implements the peer, event and orderer ports, so the same value can be
/// handed to every stage of the client. Cloning shares the network.
#[derive(Clone)]
pub struct SimNetwork {
    pub(crate) inner: Arc<Inner>,
}

impl SimNetwork {
    pub fn new(config: SimConfig) -> Self {
        let mut chaincodes: HashMap<String, Arc<dyn Chaincode>> = HashMap::new();
        chaincodes.insert("example_cc".into(), Arc::new(ExampleChaincode));
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(NetworkState::default()),
                chaincodes: RwLock::new(chaincodes),
                bus: InMemoryEventBus::new(),
                faults: FaultInjector::new(),
                broadcasts: Mutex::new(Vec::new()),
                proposals_received: AtomicU64::new(0),
                blocks_cut: AtomicU64::new(0),
            }),
        }
    }

    /// Stand up one simulated node for every peer and orderer in `registry`.
    pub fn from_registry(registry: &EndpointRegistry, config: SimConfig) -> Self {
        let network = Self::new(config);
        for peer in registry.peers() {
            let msp_id = registry
                .organization(&peer.org)
                .map_or(peer.org.as_str(), |o| o.msp_id.as_str());
            network.add_peer(peer.clone(), msp_id);
        }
        for orderer in registry.orderers() {
            network.add_orderer(orderer.clone());
        }
        network
    }

    pub fn add_peer(&self, endpoint: PeerEndpoint, msp_id: &str) {
        let identity =
            LocalSigningIdentity::generate(&endpoint.org, msp_id, &endpoint.name, Role::User);
        debug!(peer = %endpoint.name, msp_id, "Simulated peer started");
        self.inner.state.write().peers.insert(
            endpoint.name.clone(),
            SimPeer {
                endpoint,
                identity,
                channels: BTreeSet::new(),
                installed: Vec::new(),
            },
        );
    }

    pub fn add_orderer(&self, endpoint: OrdererEndpoint) {
        debug!(orderer = %endpoint.name, "Simulated orderer started");
        self.inner
            .state
            .write()
            .orderers
            .insert(endpoint.name.clone(), endpoint);
    }

    /// Bind a chaincode implementation to a name. Names without a binding
    /// run [`KeyValueChaincode`].
    pub fn register_chaincode(&self, name: impl Into<String>, chaincode: Arc<dyn Chaincode>) {
        self.inner.chaincodes.write().insert(name.into(), chaincode);
    }

    pub(crate) fn chaincode(&self, name: &str) -> Arc<dyn Chaincode> {
        self.inner
            .chaincodes
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(KeyValueChaincode))
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.inner.faults
    }

    pub fn config(&self) -> SimConfig {
        self.inner.config
    }

    // =========================================================================
    // BOOTSTRAP SHORTCUTS
    // =========================================================================

    /// Create `channel` and join `peers` without going through the client.
    pub fn bootstrap_channel(&self, channel: &str, organizations: &[&str], peers: &[&str]) -> SimResult<()> {
        let mut guard = self.inner.state.write();
        let state = &mut *guard;
        if state.ledgers.contains_key(channel) {
            return Err(SimError::ChannelExists(channel.to_string()));
        }
        for peer in peers {
            if !state.peers.contains_key(*peer) {
                return Err(SimError::UnknownPeer(peer.to_string()));
            }
        }

        let update = ConfigUpdate {
            channel: channel.to_string(),
            profile: "bootstrap".into(),
            organizations: organizations.iter().map(|o| o.to_string()).collect(),
            config_tx: Vec::new(),
        };
        let ledger = ChannelLedger::create(&update, state.orderers.keys().cloned().collect())?;
        state.ledgers.insert(channel.to_string(), ledger);
        for peer in peers {
            if let Some(p) = state.peers.get_mut(*peer) {
                p.channels.insert(channel.to_string());
            }
        }
        info!(channel, peers = peers.len(), "Channel bootstrapped");
        Ok(())
    }

    /// Install `name@version` on every joined peer of `channel` and commit
    /// its instantiation directly.
    pub fn preload_chaincode(&self, channel: &str, name: &str, version: &str, init_args: &[&str]) -> SimResult<()> {
        let chaincode = self.chaincode(name);
        let mut guard = self.inner.state.write();
        let state = &mut *guard;
        let ledger = state
            .ledgers
            .get_mut(channel)
            .ok_or_else(|| SimError::UnknownChannel(channel.to_string()))?;

        let args: Vec<Vec<u8>> = init_args.iter().map(|a| a.as_bytes().to_vec()).collect();
        let mut ctx = TxContext::new(ledger.state(), name);
        chaincode
            .init(&mut ctx, "init", &args)
            .map_err(|message| SimError::Chaincode {
                chaincode: name.to_string(),
                message,
            })?;
        let rwset = ctx.into_rwset();
        let tx_id = TxId::from_digest(&sha256_many(&[
            channel.as_bytes(),
            name.as_bytes(),
            version.as_bytes(),
        ]));
        ledger.commit(
            tx_id,
            Some(PendingTx {
                kind: ProposalKind::Instantiate,
                chaincode: name.to_string(),
                version: Some(version.to_string()),
                rwset,
            }),
        );

        for peer in state.peers.values_mut().filter(|p| p.channels.contains(channel)) {
            if !peer.has_installed(name, version) {
                peer.installed.push(ChaincodeInfo {
                    name: name.to_string(),
                    version: version.to_string(),
                    path: format!("preloaded/{name}"),
                });
            }
        }
        info!(channel, chaincode = name, version, "Chaincode preloaded");
        Ok(())
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    pub fn broadcast_log(&self) -> Vec<BroadcastRecord> {
        self.inner.broadcasts.lock().clone()
    }

    pub fn proposals_received(&self) -> u64 {
        self.inner.proposals_received.load(Ordering::Relaxed)
    }

    pub fn blocks_cut(&self) -> u64 {
        self.inner.blocks_cut.load(Ordering::Relaxed)
    }

    pub fn ledger_height(&self, channel: &str) -> Option<u64> {
        self.inner.state.read().ledgers.get(channel).map(ChannelLedger::height)
    }

    /// Committed value of `key` in `chaincode`'s namespace, as text.
    pub fn state_value(&self, channel: &str, chaincode: &str, key: &str) -> Option<String> {
        let state = self.inner.state.read();
        let value = state.ledgers.get(channel)?.state().get(chaincode, key)?;
        Some(String::from_utf8_lossy(&value.value).into_owned())
    }

    pub fn joined_channels(&self, peer: &str) -> Vec<String> {
        self.inner
            .state
            .read()
            .peers
            .get(peer)
            .map(|p| p.channels.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn installed_chaincodes(&self, peer: &str) -> Vec<ChaincodeInfo> {
        self.inner
            .state
            .read()
            .peers
            .get(peer)
            .map(|p| p.installed.clone())
            .unwrap_or_default()
    }

    /// Endorsing identities of every simulated peer, as a client would load
    /// them from its organizations' membership material.
    pub fn peer_keyring(&self) -> PeerKeyring {
        let mut keyring = PeerKeyring::new();
        for (name, peer) in &self.inner.state.read().peers {
            if let Err(e) = keyring.insert(name.clone(), peer.identity.descriptor()) {
                warn!(peer = %name, error = %e, "Peer identity not trusted");
            }
        }
        keyring
    }
}

/// Check that `signature` over `message` was made by the identity encoded in
/// `creator`.
pub(crate) fn verify_creator(creator: &[u8], message: &[u8], signature: &[u8]) -> Result<IdentityDescriptor, String> {
    let identity: IdentityDescriptor =
        from_canonical_bytes(creator).map_err(|e| format!("access denied: {e}"))?;
    verify_signature(&identity.public_key, message, signature).map_err(|_| {
        format!(
            "access denied: bad signature from {}@{}",
            identity.name, identity.msp_id
        )
    })?;
    Ok(identity)
}
