//! # Network Profile
//!
//! JSON description of the network a client talks to: organizations and
//! their users, peers, orderers and channels, plus client defaults. The
//! profile is turned into an [`EndpointRegistry`] and an identity store at
//! startup and is not consulted afterwards.

use fc_05_channel_orchestrator::{ConfigError, OrchestratorConfig};
use serde::{Deserialize, Serialize};
use shared_crypto::{Ed25519KeyPair, LocalIdentityStore, LocalSigningIdentity};
use shared_types::{
    EndorsementPolicy, EndpointRegistry, OrdererEndpoint, Organization, PeerEndpoint, PeerRoles,
    Role,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("peer {0} is not listed by any organization")]
    OrphanPeer(String),

    #[error("organization {org} lists unknown peer {peer}")]
    UnknownPeer { org: String, peer: String },

    #[error("channel {channel} references unknown {kind} {name}")]
    UnknownMember {
        channel: String,
        kind: &'static str,
        name: String,
    },

    #[error("key seed of {user}@{org} is invalid: {reason}")]
    InvalidKey {
        org: String,
        user: String,
        reason: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Hex-encoded 32-byte Ed25519 seed. A fresh key is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_seed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub msp_id: String,
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerProfile {
    pub url: String,
    #[serde(default)]
    pub roles: PeerRoles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererProfile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChannelProfile {
    #[serde(default)]
    pub orderers: Vec<String>,
    #[serde(default)]
    pub peers: Vec<String>,
    /// Falls back to the client's default policy.
    #[serde(default)]
    pub policy: Option<EndorsementPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub name: String,
    #[serde(default)]
    pub client: OrchestratorConfig,
    pub organizations: BTreeMap<String, OrganizationProfile>,
    pub peers: BTreeMap<String, PeerProfile>,
    pub orderers: BTreeMap<String, OrdererProfile>,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelProfile>,
}

impl NetworkProfile {
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The demo network: two organizations with two peers each, one
    /// orderer and `businesschannel` spanning all four peers.
    pub fn sample() -> Self {
        let users = || {
            vec![
                UserProfile {
                    name: "Admin".into(),
                    role: Role::Admin,
                    key_seed: None,
                },
                UserProfile {
                    name: "User1".into(),
                    role: Role::User,
                    key_seed: None,
                },
            ]
        };
        let mut organizations = BTreeMap::new();
        let mut peers = BTreeMap::new();
        for (org, msp_id, base_port) in [
            ("org1.example.com", "Org1MSP", 7051),
            ("org2.example.com", "Org2MSP", 8051),
        ] {
            let names: Vec<String> = (0..2).map(|i| format!("peer{i}.{org}")).collect();
            for (i, name) in names.iter().enumerate() {
                peers.insert(
                    name.clone(),
                    PeerProfile {
                        url: format!("grpc://localhost:{}", base_port + 5 * i),
                        roles: PeerRoles::default(),
                    },
                );
            }
            organizations.insert(
                org.to_string(),
                OrganizationProfile {
                    msp_id: msp_id.into(),
                    peers: names,
                    users: users(),
                },
            );
        }

        let mut orderers = BTreeMap::new();
        orderers.insert(
            "orderer.example.com".to_string(),
            OrdererProfile {
                url: "grpc://localhost:7050".into(),
            },
        );
        let mut channels = BTreeMap::new();
        channels.insert(
            "businesschannel".to_string(),
            ChannelProfile {
                orderers: vec!["orderer.example.com".into()],
                peers: peers.keys().cloned().collect(),
                policy: None,
            },
        );

        Self {
            name: "sample-network".into(),
            client: OrchestratorConfig::default(),
            organizations,
            peers,
            orderers,
            channels,
        }
    }

    /// Organization that lists `peer`.
    fn owner_of(&self, peer: &str) -> Option<&str> {
        self.organizations
            .iter()
            .find(|(_, org)| org.peers.iter().any(|p| p == peer))
            .map(|(name, _)| name.as_str())
    }

    pub fn registry(&self) -> Result<EndpointRegistry, ProfileError> {
        self.client.validate()?;
        let mut registry = EndpointRegistry::new();
        for (name, org) in &self.organizations {
            if let Some(peer) = org.peers.iter().find(|p| !self.peers.contains_key(*p)) {
                return Err(ProfileError::UnknownPeer {
                    org: name.clone(),
                    peer: peer.clone(),
                });
            }
            registry.add_organization(Organization::new(name.as_str(), org.msp_id.as_str()));
        }
        for (name, peer) in &self.peers {
            let org = self
                .owner_of(name)
                .ok_or_else(|| ProfileError::OrphanPeer(name.clone()))?;
            let mut endpoint = PeerEndpoint::new(name.as_str(), org, peer.url.as_str());
            endpoint.roles = peer.roles;
            registry.add_peer(endpoint);
        }
        for (name, orderer) in &self.orderers {
            registry.add_orderer(OrdererEndpoint::new(name.as_str(), orderer.url.as_str()));
        }

        for (name, channel) in &self.channels {
            let policy = channel
                .policy
                .clone()
                .unwrap_or_else(|| self.client.default_policy.clone());
            registry.new_channel(name, policy);
            for orderer in &channel.orderers {
                registry
                    .add_orderer_to_channel(name, orderer)
                    .map_err(|_| ProfileError::UnknownMember {
                        channel: name.clone(),
                        kind: "orderer",
                        name: orderer.clone(),
                    })?;
            }
            for peer in &channel.peers {
                registry
                    .add_peer_to_channel(name, peer)
                    .map_err(|_| ProfileError::UnknownMember {
                        channel: name.clone(),
                        kind: "peer",
                        name: peer.clone(),
                    })?;
            }
        }
        Ok(registry)
    }

    pub fn identities(&self) -> Result<LocalIdentityStore, ProfileError> {
        let store = LocalIdentityStore::new();
        for (org_name, org) in &self.organizations {
            for user in &org.users {
                let keypair = match &user.key_seed {
                    Some(seed) => Ed25519KeyPair::from_hex_seed(seed).map_err(|e| ProfileError::InvalidKey {
                        org: org_name.clone(),
                        user: user.name.clone(),
                        reason: e.to_string(),
                    })?,
                    None => Ed25519KeyPair::generate(),
                };
                store.insert(Arc::new(LocalSigningIdentity::new(
                    org_name.as_str(),
                    org.msp_id.as_str(),
                    user.name.as_str(),
                    user.role,
                    keypair,
                )));
            }
        }
        Ok(store)
    }
}
