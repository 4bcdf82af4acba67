//! Commit Monitor service.

use crate::domain::state::{CommitOutcome, CommitTracker, ReadinessOutcome};
use crate::error::{CommitError, CommitResult};
use crate::ports::inbound::{CommitMonitorApi, CommitWatch, ReadyWatch};
use crate::ports::outbound::{LedgerEventSource, LedgerEventStream};
use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{select_all, StreamExt};
use shared_bus::{EventFilter, LedgerEvent};
use shared_types::{CallContext, PeerEndpoint, TxId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Watches ledger events through a [`LedgerEventSource`].
pub struct CommitMonitorService<S: LedgerEventSource> {
    source: Arc<S>,
}

impl<S: LedgerEventSource> CommitMonitorService<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Subscribe on every peer concurrently, keeping the ones that succeed.
    async fn subscribe_all(
        &self,
        channel: &str,
        peers: &[PeerEndpoint],
        filter: &EventFilter,
    ) -> CommitResult<Vec<(String, LedgerEventStream)>> {
        if peers.is_empty() {
            return Err(CommitError::NoEventPeers {
                channel: channel.to_string(),
            });
        }

        let attempts = peers.iter().map(|peer| async move {
            let result = self
                .source
                .subscribe(peer, filter.clone().from_peer(&peer.name))
                .await;
            (peer, result)
        });

        let mut streams = Vec::with_capacity(peers.len());
        let mut failures = Vec::new();
        for (peer, result) in join_all(attempts).await {
            match result {
                Ok(stream) => {
                    debug!(channel = %channel, peer = %peer.name, "Event subscription opened");
                    streams.push((peer.name.clone(), stream));
                }
                Err(e) => {
                    warn!(channel = %channel, peer = %peer.name, error = %e, "Event subscription failed");
                    failures.push(format!("{}: {e}", peer.name));
                }
            }
        }

        if streams.is_empty() {
            return Err(CommitError::NoEventSource {
                channel: channel.to_string(),
                failures,
            });
        }
        Ok(streams)
    }
}

#[async_trait]
impl<S: LedgerEventSource + 'static> CommitMonitorApi for CommitMonitorService<S> {
    async fn watch(
        &self,
        channel: &str,
        tx_id: &TxId,
        peers: &[PeerEndpoint],
    ) -> CommitResult<CommitWatch> {
        let filter = EventFilter::transaction(channel, tx_id);
        let streams = self.subscribe_all(channel, peers, &filter).await?;
        Ok(CommitWatch::new(channel, tx_id.clone(), streams))
    }

    async fn wait(&self, watch: CommitWatch, ctx: &CallContext) -> CommitResult<CommitOutcome> {
        let CommitWatch {
            channel,
            tx_id,
            streams,
        } = watch;
        let mut tracker = CommitTracker::new(channel.as_str(), tx_id.clone());
        let mut events = select_all(streams.into_iter().map(|(_, stream)| stream));

        let deadline = tokio::time::sleep(ctx.timeouts.commit);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    return Err(CommitError::Cancelled { tx_id });
                }
                _ = &mut deadline => {
                    warn!(tx_id = %tx_id.short(), channel = %channel, "No commit event within window");
                    return Ok(tracker.expire());
                }
                event = events.next() => match event {
                    Some(event) => {
                        if let Some(outcome) = tracker.observe(&event) {
                            info!(
                                tx_id = %tx_id.short(),
                                status = %outcome.status,
                                block = ?outcome.block_number,
                                peer = ?outcome.peer,
                                "Transaction resolved"
                            );
                            return Ok(outcome);
                        }
                    }
                    None => {
                        warn!(tx_id = %tx_id.short(), channel = %channel, "All event streams closed before commit");
                        return Ok(tracker.expire());
                    }
                },
            }
        }
    }

    async fn watch_ready(
        &self,
        channel: &str,
        chaincode: &str,
        peers: &[PeerEndpoint],
    ) -> CommitResult<ReadyWatch> {
        let filter = EventFilter::chaincode_ready(channel, chaincode);
        let streams = self.subscribe_all(channel, peers, &filter).await?;
        Ok(ReadyWatch::new(channel, chaincode, streams))
    }

    async fn wait_ready(&self, watch: ReadyWatch, ctx: &CallContext) -> CommitResult<ReadinessOutcome> {
        let ReadyWatch {
            channel,
            chaincode,
            streams,
        } = watch;
        let mut events = select_all(streams.into_iter().map(|(_, stream)| stream));

        let deadline = tokio::time::sleep(ctx.timeouts.ready);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    return Err(CommitError::ReadinessCancelled { chaincode });
                }
                _ = &mut deadline => {
                    warn!(channel = %channel, chaincode = %chaincode, "Chaincode not ready within window");
                    return Ok(ReadinessOutcome::TimedOut);
                }
                event = events.next() => match event {
                    Some(LedgerEvent::ChaincodeReady { peer, chaincode: name, version, .. }) if name == chaincode => {
                        info!(channel = %channel, chaincode = %chaincode, peer = %peer, version = %version, "Chaincode ready");
                        return Ok(ReadinessOutcome::Ready { peer, version });
                    }
                    Some(_) => {}
                    None => return Ok(ReadinessOutcome::TimedOut),
                },
            }
        }
    }
}
