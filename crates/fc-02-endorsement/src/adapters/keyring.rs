//! Endorsement verification against peer identities known ahead of time.
//!
//! A response names its endorser, but the name and key it carries are only
//! claims. The keyring holds the identity each peer is expected to sign
//! with and re-verifies every signature against that identity.

use crate::ports::outbound::EndorsementVerifier;
use shared_crypto::{endorsement_digest, CryptoError, Ed25519PublicKey};
use shared_types::{from_canonical_bytes, EndorsementResponse, IdentityDescriptor, PeerEndpoint};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TrustedPeer {
    msp_id: String,
    public_key: Ed25519PublicKey,
}

/// Trusted peer identities, keyed by peer name.
#[derive(Debug, Clone, Default)]
pub struct PeerKeyring {
    peers: HashMap<String, TrustedPeer>,
}

impl PeerKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `descriptor` as the identity `peer` endorses with. Replaces any
    /// earlier entry for the same peer.
    pub fn insert(&mut self, peer: impl Into<String>, descriptor: &IdentityDescriptor) -> Result<(), CryptoError> {
        let public_key = Ed25519PublicKey::from_slice(&descriptor.public_key)?;
        self.peers.insert(
            peer.into(),
            TrustedPeer {
                msp_id: descriptor.msp_id.clone(),
                public_key,
            },
        );
        Ok(())
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.peers.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl EndorsementVerifier for PeerKeyring {
    fn verify_endorsement(&self, peer: &PeerEndpoint, response: &EndorsementResponse) -> Result<(), String> {
        let trusted = self
            .peers
            .get(&peer.name)
            .ok_or_else(|| format!("no identity on record for {}", peer.name))?;

        let endorser: IdentityDescriptor = from_canonical_bytes(&response.endorsement.endorser)
            .map_err(|e| format!("undecodable endorser identity: {e}"))?;
        if endorser.msp_id != trusted.msp_id
            || endorser.public_key.as_slice() != trusted.public_key.as_bytes().as_slice()
        {
            return Err(format!(
                "signed by {}@{}, not by {}",
                endorser.name, endorser.msp_id, peer.name
            ));
        }

        let message = endorsement_digest(&response.payload_hash, &response.result_digest);
        trusted
            .public_key
            .verify(&message, &response.endorsement.signature)
            .map_err(|e| e.to_string())
    }
}
