//! # Inbound Ports (Driving Ports / API)

use crate::domain::state::{CommitOutcome, ReadinessOutcome};
use crate::error::CommitResult;
use crate::ports::outbound::LedgerEventStream;
use async_trait::async_trait;
use shared_types::{CallContext, PeerEndpoint, TxId};
use std::fmt;

/// Open subscriptions for one transaction, taken before broadcast.
pub struct CommitWatch {
    pub channel: String,
    pub tx_id: TxId,
    pub(crate) streams: Vec<(String, LedgerEventStream)>,
}

impl CommitWatch {
    pub fn new(channel: impl Into<String>, tx_id: TxId, streams: Vec<(String, LedgerEventStream)>) -> Self {
        Self {
            channel: channel.into(),
            tx_id,
            streams,
        }
    }

    /// Peers this watch listens on.
    pub fn peers(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|(peer, _)| peer.as_str())
    }
}

impl fmt::Debug for CommitWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitWatch")
            .field("channel", &self.channel)
            .field("tx_id", &self.tx_id)
            .field("peers", &self.peers().collect::<Vec<_>>())
            .finish()
    }
}

/// Open subscriptions for one chaincode's readiness.
pub struct ReadyWatch {
    pub channel: String,
    pub chaincode: String,
    pub(crate) streams: Vec<(String, LedgerEventStream)>,
}

impl ReadyWatch {
    pub fn new(
        channel: impl Into<String>,
        chaincode: impl Into<String>,
        streams: Vec<(String, LedgerEventStream)>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chaincode: chaincode.into(),
            streams,
        }
    }
}

impl fmt::Debug for ReadyWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyWatch")
            .field("channel", &self.channel)
            .field("chaincode", &self.chaincode)
            .field("streams", &self.streams.len())
            .finish()
    }
}

/// Primary Commit Monitor API.
#[async_trait]
pub trait CommitMonitorApi: Send + Sync {
    /// Subscribe to block events for `tx_id` on every peer in `peers`.
    ///
    /// Fails only if no subscription at all could be opened.
    async fn watch(
        &self,
        channel: &str,
        tx_id: &TxId,
        peers: &[PeerEndpoint],
    ) -> CommitResult<CommitWatch>;

    /// Wait for the first matching event, bounded by `ctx.timeouts.commit`.
    async fn wait(&self, watch: CommitWatch, ctx: &CallContext) -> CommitResult<CommitOutcome>;

    /// Subscribe to readiness events of `chaincode`.
    async fn watch_ready(
        &self,
        channel: &str,
        chaincode: &str,
        peers: &[PeerEndpoint],
    ) -> CommitResult<ReadyWatch>;

    /// Wait for the chaincode to report ready, bounded by `ctx.timeouts.ready`.
    async fn wait_ready(&self, watch: ReadyWatch, ctx: &CallContext) -> CommitResult<ReadinessOutcome>;
}
