//! # Endpoint Registry
//!
//! Addressable handles for organizations, peers, orderers and channel
//! membership. Pure data: lookups and additive mutation only.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = EndpointRegistry::new();
//! registry.add_organization(Organization::new("org1.example.com", "Org1MSP"));
//! registry.add_peer(PeerEndpoint::new("peer0.org1.example.com", "org1.example.com", "grpcs://localhost:7051"));
//! registry.add_orderer(OrdererEndpoint::new("orderer.example.com", "grpcs://localhost:7050"));
//!
//! registry.new_channel("businesschannel", EndorsementPolicy::AllTargets);
//! registry.add_orderer_to_channel("businesschannel", "orderer.example.com")?;
//! registry.add_peer_to_channel("businesschannel", "peer0.org1.example.com")?;
//! ```

use crate::errors::RegistryError;
use crate::policy::EndorsementPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// What a peer is willing to do for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerRoles {
    pub endorsing_peer: bool,
    pub chaincode_query: bool,
    pub ledger_query: bool,
    pub event_source: bool,
}

impl Default for PeerRoles {
    fn default() -> Self {
        Self {
            endorsing_peer: true,
            chaincode_query: true,
            ledger_query: true,
            event_source: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEndpoint {
    pub name: String,
    pub org: String,
    pub url: String,
    #[serde(default)]
    pub roles: PeerRoles,
}

impl PeerEndpoint {
    pub fn new(name: impl Into<String>, org: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            org: org.into(),
            url: url.into(),
            roles: PeerRoles::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererEndpoint {
    pub name: String,
    pub url: String,
}

impl OrdererEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub msp_id: String,
    #[serde(default)]
    pub peers: Vec<String>,
}

impl Organization {
    pub fn new(name: impl Into<String>, msp_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            msp_id: msp_id.into(),
            peers: Vec::new(),
        }
    }
}

/// Logical reference to a channel's ledger: members, orderers and policy.
///
/// Peers are grouped by organization; within an organization they keep the
/// order in which they were added. Orderers keep insertion order, which is
/// the submission retry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    name: String,
    peers: BTreeMap<String, Vec<PeerEndpoint>>,
    orderers: Vec<OrdererEndpoint>,
    policy: EndorsementPolicy,
}

impl Channel {
    pub fn new(name: impl Into<String>, policy: EndorsementPolicy) -> Self {
        Self {
            name: name.into(),
            peers: BTreeMap::new(),
            orderers: Vec::new(),
            policy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &EndorsementPolicy {
        &self.policy
    }

    /// Add a member peer. Returns false if it was already a member.
    pub fn add_peer(&mut self, peer: PeerEndpoint) -> bool {
        if self.contains_peer(&peer.name) {
            return false;
        }
        self.peers.entry(peer.org.clone()).or_default().push(peer);
        true
    }

    /// Add an orderer. Returns false if it was already present.
    pub fn add_orderer(&mut self, orderer: OrdererEndpoint) -> bool {
        if self.orderers.iter().any(|o| o.name == orderer.name) {
            return false;
        }
        self.orderers.push(orderer);
        true
    }

    pub fn contains_peer(&self, name: &str) -> bool {
        self.peers().any(|p| p.name == name)
    }

    /// All member peers, grouped by organization.
    pub fn peers(&self) -> impl Iterator<Item = &PeerEndpoint> {
        self.peers.values().flatten()
    }

    pub fn peers_of(&self, org: &str) -> &[PeerEndpoint] {
        self.peers.get(org).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn organizations(&self) -> impl Iterator<Item = &str> {
        self.peers.keys().map(String::as_str)
    }

    pub fn endorsing_peers(&self) -> Vec<PeerEndpoint> {
        self.peers()
            .filter(|p| p.roles.endorsing_peer)
            .cloned()
            .collect()
    }

    pub fn event_peers(&self) -> Vec<PeerEndpoint> {
        self.peers()
            .filter(|p| p.roles.event_source)
            .cloned()
            .collect()
    }

    pub fn orderers(&self) -> &[OrdererEndpoint] {
        &self.orderers
    }
}

/// Registry of every endpoint the client knows about.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    organizations: BTreeMap<String, Organization>,
    peers: BTreeMap<String, PeerEndpoint>,
    orderers: BTreeMap<String, OrdererEndpoint>,
    channels: HashMap<String, Channel>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&mut self, org: Organization) {
        debug!(org = %org.name, msp_id = %org.msp_id, "Organization registered");
        self.organizations.insert(org.name.clone(), org);
    }

    pub fn add_peer(&mut self, peer: PeerEndpoint) {
        if let Some(org) = self.organizations.get_mut(&peer.org) {
            if !org.peers.contains(&peer.name) {
                org.peers.push(peer.name.clone());
            }
        }
        debug!(peer = %peer.name, org = %peer.org, url = %peer.url, "Peer registered");
        self.peers.insert(peer.name.clone(), peer);
    }

    pub fn add_orderer(&mut self, orderer: OrdererEndpoint) {
        debug!(orderer = %orderer.name, url = %orderer.url, "Orderer registered");
        self.orderers.insert(orderer.name.clone(), orderer);
    }

    pub fn organization(&self, name: &str) -> Option<&Organization> {
        self.organizations.get(name)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    pub fn peer(&self, name: &str) -> Option<&PeerEndpoint> {
        self.peers.get(name)
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerEndpoint> {
        self.peers.values()
    }

    pub fn orderer(&self, name: &str) -> Option<&OrdererEndpoint> {
        self.orderers.get(name)
    }

    pub fn orderers(&self) -> impl Iterator<Item = &OrdererEndpoint> {
        self.orderers.values()
    }

    /// Resolve peer names in the given order.
    pub fn resolve_peers<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PeerEndpoint>, RegistryError> {
        names
            .iter()
            .map(|n| {
                self.peer(n.as_ref())
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownPeer(n.as_ref().to_string()))
            })
            .collect()
    }

    /// Resolve orderer names in the given order.
    pub fn resolve_orderers<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<OrdererEndpoint>, RegistryError> {
        names
            .iter()
            .map(|n| {
                self.orderer(n.as_ref())
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownOrderer(n.as_ref().to_string()))
            })
            .collect()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Declare a channel. Declaring an existing channel returns it unchanged.
    pub fn new_channel(&mut self, name: &str, policy: EndorsementPolicy) -> &Channel {
        self.channels.entry(name.to_string()).or_insert_with(|| {
            debug!(channel = %name, %policy, "Channel declared");
            Channel::new(name, policy)
        })
    }

    pub fn add_peer_to_channel(&mut self, channel: &str, peer: &str) -> Result<bool, RegistryError> {
        let endpoint = self
            .peers
            .get(peer)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownPeer(peer.to_string()))?;
        let channel = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| RegistryError::UnknownChannel(channel.to_string()))?;
        Ok(channel.add_peer(endpoint))
    }

    pub fn add_orderer_to_channel(
        &mut self,
        channel: &str,
        orderer: &str,
    ) -> Result<bool, RegistryError> {
        let endpoint = self
            .orderers
            .get(orderer)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownOrderer(orderer.to_string()))?;
        let channel = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| RegistryError::UnknownChannel(channel.to_string()))?;
        Ok(channel.add_orderer(endpoint))
    }
}
