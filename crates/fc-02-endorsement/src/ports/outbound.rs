//! # Outbound Ports (Driven Ports / SPI)

use async_trait::async_trait;
use shared_types::{EndorsementResponse, PeerEndpoint, SignedProposal, TransportError};

/// Endorsement side of a peer endpoint.
///
/// Dropping the returned future must abandon the request.
#[async_trait]
pub trait PeerGateway: Send + Sync {
    /// Ask `peer` to simulate and endorse `proposal`.
    async fn process_proposal(
        &self,
        peer: &PeerEndpoint,
        proposal: &SignedProposal,
    ) -> Result<EndorsementResponse, TransportError>;
}

/// Checks a successful response against the identity of the peer it was
/// requested from. Every accepted endorsement passes through here.
pub trait EndorsementVerifier: Send + Sync {
    /// `Err` carries why the endorsement cannot be trusted.
    fn verify_endorsement(&self, peer: &PeerEndpoint, response: &EndorsementResponse) -> Result<(), String>;
}
