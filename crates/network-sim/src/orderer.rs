//! Simulated ordering service.
//!
//! Accepting a transaction schedules a block; the block is cut after
//! `block_delay`, validated against the channel ledger and announced to
//! every joined peer that is up.

use crate::faults::Fault;
use crate::ledger::ChannelLedger;
use crate::network::{verify_creator, BroadcastRecord, SimNetwork};
use async_trait::async_trait;
use fc_03_submission::{DeliverResponse, OrdererGateway};
use shared_bus::{EventPublisher, LedgerEvent};
use shared_types::{
    from_canonical_bytes, BroadcastAck, BroadcastStatus, ChannelHeader, ConfigUpdate, Envelope,
    EnvelopePayload, HeaderKind, OrdererEndpoint, ProposalKind, TransactionPayload, TransportError,
    TxId,
};
use std::sync::atomic::Ordering;
use tokio::time::sleep;
use tracing::{debug, info, warn};

fn ack(status: BroadcastStatus, info: impl Into<String>) -> BroadcastAck {
    BroadcastAck {
        status,
        info: info.into(),
    }
}

fn status_for(code: i32) -> BroadcastStatus {
    match code {
        403 => BroadcastStatus::Forbidden,
        404 => BroadcastStatus::NotFound,
        500 => BroadcastStatus::InternalError,
        503 => BroadcastStatus::ServiceUnavailable,
        _ => BroadcastStatus::BadRequest,
    }
}

#[async_trait]
impl OrdererGateway for SimNetwork {
    async fn broadcast(
        &self,
        orderer: &OrdererEndpoint,
        envelope: &Envelope,
    ) -> Result<BroadcastAck, TransportError> {
        let fault = self.inner.faults.next_fault(&orderer.name);
        self.inner.broadcasts.lock().push(BroadcastRecord {
            orderer: orderer.name.clone(),
            tx_id: envelope.tx_id().clone(),
            reached: fault != Some(Fault::Unreachable),
        });
        if let Some(refusal) = self.admit(orderer, fault).await? {
            return Ok(refusal);
        }
        Ok(self.order(envelope))
    }

    async fn fetch_genesis_block(
        &self,
        orderer: &OrdererEndpoint,
        seek: &Envelope,
    ) -> Result<DeliverResponse, TransportError> {
        let fault = self.inner.faults.next_fault(&orderer.name);
        if let Some(refusal) = self.admit(orderer, fault).await? {
            return Ok(DeliverResponse::Status(refusal.status));
        }
        let Ok(payload) = from_canonical_bytes::<EnvelopePayload>(&seek.payload_bytes) else {
            return Ok(DeliverResponse::Status(BroadcastStatus::BadRequest));
        };
        if verify_creator(&payload.signature_header.creator, &seek.payload_bytes, &seek.signature).is_err() {
            return Ok(DeliverResponse::Status(BroadcastStatus::Forbidden));
        }
        if payload.header.kind != HeaderKind::DeliverSeek {
            return Ok(DeliverResponse::Status(BroadcastStatus::BadRequest));
        }
        let state = self.inner.state.read();
        Ok(match state.ledgers.get(&payload.header.channel) {
            Some(ledger) => DeliverResponse::Block(ledger.genesis().clone()),
            None => DeliverResponse::Status(BroadcastStatus::NotFound),
        })
    }
}

impl SimNetwork {
    /// Apply the orderer's fault, if any. `Some` is a refusal to return as is.
    async fn admit(
        &self,
        orderer: &OrdererEndpoint,
        fault: Option<Fault>,
    ) -> Result<Option<BroadcastAck>, TransportError> {
        if !self.inner.state.read().orderers.contains_key(&orderer.name) {
            return Err(TransportError::unreachable(&orderer.url, "no such orderer"));
        }
        match fault {
            Some(Fault::Unreachable) => Err(TransportError::unreachable(&orderer.url, "connection refused")),
            Some(Fault::Hang) => std::future::pending().await,
            Some(Fault::Delay(pause)) => {
                sleep(pause).await;
                Ok(None)
            }
            Some(Fault::Reject { status, message }) => Ok(Some(ack(status_for(status), message))),
            Some(Fault::Diverge | Fault::Impersonate { .. }) | None => Ok(None),
        }
    }

    fn order(&self, envelope: &Envelope) -> BroadcastAck {
        let payload: EnvelopePayload = match from_canonical_bytes(&envelope.payload_bytes) {
            Ok(payload) => payload,
            Err(e) => return ack(BroadcastStatus::BadRequest, e.to_string()),
        };
        if let Err(reason) = verify_creator(
            &payload.signature_header.creator,
            &envelope.payload_bytes,
            &envelope.signature,
        ) {
            return ack(BroadcastStatus::Forbidden, reason);
        }
        match payload.header.kind {
            HeaderKind::ConfigUpdate => self.create_channel(&payload.data),
            HeaderKind::EndorserTransaction => self.enqueue(payload.header, &payload.data),
            HeaderKind::DeliverSeek => ack(
                BroadcastStatus::BadRequest,
                "seek requests belong to the deliver service",
            ),
        }
    }

    fn create_channel(&self, data: &[u8]) -> BroadcastAck {
        let update: ConfigUpdate = match from_canonical_bytes(data) {
            Ok(update) => update,
            Err(e) => return ack(BroadcastStatus::BadRequest, e.to_string()),
        };
        let mut state = self.inner.state.write();
        if state.ledgers.contains_key(&update.channel) {
            return ack(
                BroadcastStatus::BadRequest,
                format!("channel {} already exists", update.channel),
            );
        }
        let orderers = state.orderers.keys().cloned().collect();
        match ChannelLedger::create(&update, orderers) {
            Ok(ledger) => {
                state.ledgers.insert(update.channel.clone(), ledger);
                info!(channel = %update.channel, profile = %update.profile, "Channel created");
                BroadcastAck::success()
            }
            Err(e) => ack(BroadcastStatus::InternalError, e.to_string()),
        }
    }

    fn enqueue(&self, header: ChannelHeader, data: &[u8]) -> BroadcastAck {
        match from_canonical_bytes::<TransactionPayload>(data) {
            Ok(tx) if tx.endorsements.is_empty() => {
                return ack(BroadcastStatus::BadRequest, "transaction carries no endorsements")
            }
            Ok(_) => {}
            Err(e) => return ack(BroadcastStatus::BadRequest, e.to_string()),
        }
        if !self.inner.state.read().ledgers.contains_key(&header.channel) {
            return ack(
                BroadcastStatus::NotFound,
                format!("channel {} not found", header.channel),
            );
        }

        debug!(tx_id = %header.tx_id.short(), channel = %header.channel, "Transaction enqueued");
        let network = self.clone();
        tokio::spawn(async move {
            sleep(network.inner.config.block_delay).await;
            network.cut_block(&header.channel, header.tx_id).await;
        });
        BroadcastAck::success()
    }

    async fn cut_block(&self, channel: &str, tx_id: TxId) {
        let (block, committers, deployed) = {
            let mut guard = self.inner.state.write();
            let state = &mut *guard;
            let pending = state.pending.remove(&tx_id);
            let lifecycle = pending
                .as_ref()
                .filter(|tx| matches!(tx.kind, ProposalKind::Instantiate | ProposalKind::Upgrade))
                .map(|tx| (tx.chaincode.clone(), tx.version.clone().unwrap_or_default()));
            let Some(ledger) = state.ledgers.get_mut(channel) else {
                warn!(channel, "Block for vanished channel dropped");
                return;
            };
            let block = ledger.commit(tx_id, pending);

            let joined = state.peers.values().filter(|p| p.channels.contains(channel));
            let committers: Vec<String> = joined.clone().map(|p| p.endpoint.name.clone()).collect();
            let deployed = lifecycle
                .filter(|_| block.transactions.iter().all(|t| t.code.is_valid()))
                .map(|(chaincode, version)| {
                    let hosts: Vec<String> = joined
                        .filter(|p| p.has_installed(&chaincode, &version))
                        .map(|p| p.endpoint.name.clone())
                        .collect();
                    (chaincode, version, hosts)
                });
            (block, committers, deployed)
        };
        self.inner.blocks_cut.fetch_add(1, Ordering::Relaxed);
        debug!(channel, block = block.number, "Block cut");

        for peer in committers {
            if self.inner.faults.is_down(&peer) {
                continue;
            }
            self.inner
                .bus
                .publish(LedgerEvent::BlockCommitted {
                    channel: channel.to_string(),
                    peer,
                    block_number: block.number,
                    transactions: block.transactions.clone(),
                })
                .await;
        }

        if let Some((chaincode, version, hosts)) = deployed {
            sleep(self.inner.config.ready_delay).await;
            for peer in hosts {
                if self.inner.faults.is_down(&peer) {
                    continue;
                }
                self.inner
                    .bus
                    .publish(LedgerEvent::ChaincodeReady {
                        channel: channel.to_string(),
                        peer,
                        chaincode: chaincode.clone(),
                        version: version.clone(),
                    })
                    .await;
            }
        }
    }
}
