//! Endorsement Collector service.

use crate::domain::entities::{
    distinct_targets, CollectionMode, EndorsementRequest, EndorsementSet, FailureReason, PeerFailure,
};
use crate::domain::policy::{Endorser, PolicyEvaluator};
use crate::error::{EndorsementError, EndorsementResult};
use crate::ports::inbound::EndorsementApi;
use crate::ports::outbound::{EndorsementVerifier, PeerGateway};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use shared_crypto::sha256;
use shared_types::{CallContext, EndorsementResponse, PeerEndpoint, TransportError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fans proposals out through a [`PeerGateway`] and checks every answer with
/// an [`EndorsementVerifier`].
pub struct EndorsementService<G: PeerGateway, V: EndorsementVerifier> {
    gateway: Arc<G>,
    verifier: Arc<V>,
}

impl<G: PeerGateway, V: EndorsementVerifier> EndorsementService<G, V> {
    pub fn new(gateway: Arc<G>, verifier: Arc<V>) -> Self {
        Self { gateway, verifier }
    }
}

/// Mutable bookkeeping of one fan-out.
struct Collection<'a> {
    request: &'a EndorsementRequest,
    verifier: &'a dyn EndorsementVerifier,
    evaluator: PolicyEvaluator<'a>,
    accepted: Vec<EndorsementResponse>,
    /// Targeted endpoint behind each accepted response, same order.
    accepted_by: Vec<&'a PeerEndpoint>,
    failed: Vec<PeerFailure>,
    pending: Vec<&'a PeerEndpoint>,
}

impl<'a> Collection<'a> {
    fn new(request: &'a EndorsementRequest, verifier: &'a dyn EndorsementVerifier) -> Self {
        Self {
            request,
            verifier,
            evaluator: PolicyEvaluator::new(&request.policy, &request.targets),
            accepted: Vec::new(),
            accepted_by: Vec::new(),
            failed: Vec::new(),
            pending: request.targets.iter().collect(),
        }
    }

    /// Policy input comes from the endpoints the proposal was sent to, never
    /// from what a response says about itself.
    fn accepted_endorsers(&self) -> Vec<Endorser<'_>> {
        self.accepted_by
            .iter()
            .map(|p| (p.name.as_str(), p.org.as_str()))
            .collect()
    }

    fn pending_endorsers(&self) -> Vec<Endorser<'_>> {
        self.pending
            .iter()
            .map(|p| (p.name.as_str(), p.org.as_str()))
            .collect()
    }

    fn pending_names(&self) -> Vec<String> {
        self.pending.iter().map(|p| p.name.clone()).collect()
    }

    fn accepted_names(&self) -> Vec<String> {
        self.accepted_by.iter().map(|p| p.name.clone()).collect()
    }

    fn is_satisfied(&self) -> bool {
        self.evaluator.is_satisfied(&self.accepted_endorsers())
    }

    fn is_reachable(&self) -> bool {
        self.evaluator
            .is_reachable(&self.accepted_endorsers(), &self.pending_endorsers())
    }

    /// Record one peer's answer. Fails only on a result mismatch.
    fn record(
        &mut self,
        peer: &'a PeerEndpoint,
        result: Result<EndorsementResponse, TransportError>,
    ) -> EndorsementResult<()> {
        if let Some(i) = self.pending.iter().position(|p| p.name == peer.name) {
            self.pending.remove(i);
        }
        let request: &'a EndorsementRequest = self.request;
        let proposal = &request.proposal;

        let reason = match result {
            Err(e) => FailureReason::Transport(e),
            Ok(response) if !response.is_success() => FailureReason::Rejected {
                status: response.status,
                message: response.message,
            },
            Ok(response) if response.payload_hash != sha256(&proposal.proposal_bytes) => {
                FailureReason::ForeignResponse {
                    detail: "response hash does not match proposal".into(),
                }
            }
            Ok(response) if response.peer != peer.name || response.org != peer.org => {
                FailureReason::ForeignResponse {
                    detail: format!("answered as {} of {}", response.peer, response.org),
                }
            }
            Ok(response) => match self.verifier.verify_endorsement(peer, &response) {
                Err(detail) => FailureReason::InvalidSignature { detail },
                Ok(()) => {
                    if let (Some(first), Some(first_peer)) = (self.accepted.first(), self.accepted_by.first()) {
                        if request.check_consistency && first.result_digest != response.result_digest {
                            return Err(EndorsementError::ResultMismatch {
                                tx_id: proposal.tx_id().clone(),
                                first_peer: first_peer.name.clone(),
                                first_digest: hex::encode(first.result_digest),
                                peer: peer.name.clone(),
                                digest: hex::encode(response.result_digest),
                            });
                        }
                    }
                    debug!(
                        tx_id = %proposal.tx_id().short(),
                        peer = %peer.name,
                        status = response.status,
                        "Endorsement accepted"
                    );
                    self.accepted.push(response);
                    self.accepted_by.push(peer);
                    return Ok(());
                }
            },
        };

        warn!(
            tx_id = %proposal.tx_id().short(),
            peer = %peer.name,
            reason = %reason,
            "Endorsement failed"
        );
        self.failed.push(PeerFailure {
            peer: peer.name.clone(),
            org: peer.org.clone(),
            reason,
        });
        Ok(())
    }

    fn not_met(&self) -> EndorsementError {
        EndorsementError::PolicyNotMet {
            policy: self.request.policy.to_string(),
            accepted: self.accepted_names(),
            failed: self.failed.clone(),
        }
    }

    fn into_set(self) -> EndorsementSet {
        EndorsementSet {
            tx_id: self.request.proposal.tx_id().clone(),
            unanswered: self.pending_names(),
            accepted: self.accepted,
            failed: self.failed,
        }
    }
}

#[async_trait]
impl<G: PeerGateway + 'static, V: EndorsementVerifier + 'static> EndorsementApi for EndorsementService<G, V> {
    async fn collect(
        &self,
        mut request: EndorsementRequest,
        ctx: &CallContext,
    ) -> EndorsementResult<EndorsementSet> {
        request.targets = distinct_targets(std::mem::take(&mut request.targets));
        let tx_id = request.proposal.tx_id().clone();
        if request.targets.is_empty() {
            return Err(EndorsementError::NoTargets { tx_id });
        }
        if !PolicyEvaluator::new(&request.policy, &request.targets).is_feasible() {
            return Err(EndorsementError::PolicyUnsatisfiable {
                policy: request.policy.to_string(),
            });
        }
        if ctx.is_cancelled() {
            return Err(EndorsementError::Cancelled {
                pending: request.targets.iter().map(|p| p.name.clone()).collect(),
            });
        }

        info!(
            tx_id = %tx_id.short(),
            peers = request.targets.len(),
            policy = %request.policy,
            mode = ?request.mode,
            "Sending proposal"
        );

        let proposal = request.proposal.as_ref();
        let gateway = self.gateway.as_ref();
        let mut in_flight: FuturesUnordered<_> = request
            .targets
            .iter()
            .map(|peer| async move { (peer, gateway.process_proposal(peer, proposal).await) })
            .collect();

        let deadline = tokio::time::sleep(ctx.timeouts.endorsement);
        tokio::pin!(deadline);

        let mut collection = Collection::new(&request, self.verifier.as_ref());
        loop {
            if request.mode == CollectionMode::Quorum && collection.is_satisfied() {
                break;
            }
            if collection.pending.is_empty() {
                if collection.is_satisfied() {
                    break;
                }
                return Err(collection.not_met());
            }
            if !collection.is_reachable() {
                return Err(collection.not_met());
            }

            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    warn!(tx_id = %tx_id.short(), pending = collection.pending.len(), "Endorsement cancelled");
                    return Err(EndorsementError::Cancelled { pending: collection.pending_names() });
                }
                _ = &mut deadline => {
                    warn!(tx_id = %tx_id.short(), pending = collection.pending.len(), "Endorsement window elapsed");
                    return Err(EndorsementError::Timeout {
                        accepted: collection.accepted_names(),
                        pending: collection.pending_names(),
                        failed: collection.failed.clone(),
                    });
                }
                Some((peer, result)) = in_flight.next() => {
                    collection.record(peer, result)?;
                }
            }
        }

        let set = collection.into_set();
        info!(
            tx_id = %tx_id.short(),
            accepted = set.accepted.len(),
            failed = set.failed.len(),
            unanswered = set.unanswered.len(),
            "Endorsement policy satisfied"
        );
        Ok(set)
    }
}
