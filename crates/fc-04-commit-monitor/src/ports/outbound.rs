//! # Outbound Ports (Driven Ports / SPI)

use async_trait::async_trait;
use futures::Stream;
use shared_bus::{EventFilter, LedgerEvent};
use shared_types::{PeerEndpoint, TransportError};
use std::pin::Pin;

/// Events from one peer. Ends when the peer closes the stream.
pub type LedgerEventStream = Pin<Box<dyn Stream<Item = LedgerEvent> + Send>>;

/// Event side of a peer endpoint.
#[async_trait]
pub trait LedgerEventSource: Send + Sync {
    /// Open a stream of events from `peer` matching `filter`. Only events
    /// emitted after this returns are delivered.
    async fn subscribe(
        &self,
        peer: &PeerEndpoint,
        filter: EventFilter,
    ) -> Result<LedgerEventStream, TransportError>;
}
