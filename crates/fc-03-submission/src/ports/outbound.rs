//! # Outbound Ports (Driven Ports / SPI)

use async_trait::async_trait;
use shared_types::{BroadcastAck, BroadcastStatus, Envelope, GenesisBlock, OrdererEndpoint, TransportError};

/// Answer of an orderer's deliver service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliverResponse {
    Block(GenesisBlock),
    /// No block; the orderer answered with a status instead.
    Status(BroadcastStatus),
}

/// Orderer endpoint.
#[async_trait]
pub trait OrdererGateway: Send + Sync {
    /// Hand `envelope` to the orderer. Acceptance does not imply commit.
    async fn broadcast(
        &self,
        orderer: &OrdererEndpoint,
        envelope: &Envelope,
    ) -> Result<BroadcastAck, TransportError>;

    /// Request block zero of the channel named in `seek`.
    async fn fetch_genesis_block(
        &self,
        orderer: &OrdererEndpoint,
        seek: &Envelope,
    ) -> Result<DeliverResponse, TransportError>;
}
