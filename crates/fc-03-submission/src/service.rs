//! Transaction Submitter service.

use crate::domain::assembler::assemble_transaction;
use crate::domain::retry::RetryPolicy;
use crate::error::{AttemptFailure, SubmissionError, SubmissionResult};
use crate::ports::inbound::{SubmissionApi, SubmissionReceipt};
use crate::ports::outbound::{DeliverResponse, OrdererGateway};
use async_trait::async_trait;
use shared_types::{
    BroadcastAck, BroadcastStatus, CallContext, EndorsementResponse, Envelope, GenesisBlock,
    OrdererEndpoint, SignedProposal, SigningIdentity, TransportError, TxId,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a single orderer round-trip.
enum Attempt<T> {
    Done(T),
    /// Reachable but not serving; try the next orderer.
    Unavailable(String),
    /// Definitive refusal.
    Refused(BroadcastStatus, String),
}

/// Broadcasts envelopes through an [`OrdererGateway`].
pub struct SubmissionService<G: OrdererGateway> {
    gateway: Arc<G>,
    retry: RetryPolicy,
}

impl<G: OrdererGateway> SubmissionService<G> {
    pub fn new(gateway: Arc<G>, retry: RetryPolicy) -> Self {
        Self { gateway, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn with_retry<'a, T, F, Fut>(
        &self,
        tx_id: &TxId,
        orderers: &'a [OrdererEndpoint],
        ctx: &CallContext,
        mut op: F,
    ) -> SubmissionResult<(T, &'a OrdererEndpoint, u32)>
    where
        F: FnMut(&'a OrdererEndpoint) -> Fut + Send,
        Fut: Future<Output = Result<Attempt<T>, TransportError>> + Send,
        T: Send,
    {
        if orderers.is_empty() {
            return Err(SubmissionError::NoOrderers {
                tx_id: tx_id.clone(),
            });
        }
        let cancelled = || SubmissionError::Cancelled {
            tx_id: tx_id.clone(),
        };
        if ctx.is_cancelled() {
            return Err(cancelled());
        }

        let mut failures = Vec::new();
        for (attempt, orderer) in self.retry.schedule(orderers) {
            if attempt > 1 {
                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => return Err(cancelled()),
                    _ = tokio::time::sleep(self.retry.backoff) => {}
                }
            }
            debug!(tx_id = %tx_id.short(), orderer = %orderer.name, attempt, "Contacting orderer");

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return Err(cancelled()),
                outcome = tokio::time::timeout(ctx.timeouts.ordering, op(orderer)) => outcome,
            };

            let reason = match outcome {
                Ok(Ok(Attempt::Done(value))) => return Ok((value, orderer, attempt)),
                Ok(Ok(Attempt::Refused(status, info))) => {
                    warn!(tx_id = %tx_id.short(), orderer = %orderer.name, ?status, "Orderer rejected envelope");
                    return Err(SubmissionError::Rejected {
                        tx_id: tx_id.clone(),
                        orderer: orderer.name.clone(),
                        status,
                        info,
                    });
                }
                Ok(Ok(Attempt::Unavailable(reason))) => reason,
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("no answer within {:?}", ctx.timeouts.ordering),
            };
            warn!(
                tx_id = %tx_id.short(),
                orderer = %orderer.name,
                attempt,
                max_attempts = self.retry.max_attempts,
                reason = %reason,
                "Orderer attempt failed"
            );
            failures.push(AttemptFailure {
                attempt,
                orderer: orderer.name.clone(),
                reason,
            });
        }

        Err(SubmissionError::OrderingUnavailable {
            tx_id: tx_id.clone(),
            attempts: failures,
        })
    }
}

fn classify_ack(ack: BroadcastAck) -> Attempt<BroadcastAck> {
    match ack.status {
        BroadcastStatus::Success => Attempt::Done(ack),
        BroadcastStatus::ServiceUnavailable => {
            Attempt::Unavailable(format!("service unavailable: {}", ack.info))
        }
        status => Attempt::Refused(status, ack.info),
    }
}

fn classify_deliver(response: DeliverResponse) -> Attempt<GenesisBlock> {
    match response {
        DeliverResponse::Block(block) => Attempt::Done(block),
        DeliverResponse::Status(BroadcastStatus::ServiceUnavailable) => {
            Attempt::Unavailable("deliver service unavailable".to_string())
        }
        DeliverResponse::Status(status) => Attempt::Refused(status, "no genesis block".to_string()),
    }
}

#[async_trait]
impl<G: OrdererGateway + 'static> SubmissionApi for SubmissionService<G> {
    fn assemble(
        &self,
        identity: &dyn SigningIdentity,
        proposal: &SignedProposal,
        endorsements: &[EndorsementResponse],
    ) -> SubmissionResult<Envelope> {
        assemble_transaction(identity, proposal, endorsements)
    }

    async fn submit(
        &self,
        envelope: &Envelope,
        orderers: &[OrdererEndpoint],
        ctx: &CallContext,
    ) -> SubmissionResult<SubmissionReceipt> {
        let gateway = self.gateway.as_ref();
        let tx_id = envelope.tx_id();
        let (ack, orderer, attempts) = self
            .with_retry(tx_id, orderers, ctx, |orderer| async move {
                gateway.broadcast(orderer, envelope).await.map(classify_ack)
            })
            .await?;

        info!(tx_id = %tx_id.short(), orderer = %orderer.name, attempts, "Envelope accepted by orderer");
        Ok(SubmissionReceipt {
            tx_id: tx_id.clone(),
            orderer: orderer.name.clone(),
            attempts,
            ack,
        })
    }

    async fn fetch_genesis_block(
        &self,
        seek: &Envelope,
        orderers: &[OrdererEndpoint],
        ctx: &CallContext,
    ) -> SubmissionResult<GenesisBlock> {
        let gateway = self.gateway.as_ref();
        let (block, orderer, _) = self
            .with_retry(seek.tx_id(), orderers, ctx, |orderer| async move {
                gateway.fetch_genesis_block(orderer, seek).await.map(classify_deliver)
            })
            .await?;
        info!(channel = %block.channel, orderer = %orderer.name, "Genesis block fetched");
        Ok(block)
    }
}
