//! Simulated peers: endorsement and event delivery.
//!
//! A peer checks the creator signature, runs the proposal against its view
//! of the channel and signs the outcome. Execution errors come back as a
//! response with status 500; only transport faults surface as `Err`.

use crate::chaincode::{Chaincode, ReadWriteSet, TxContext};
use crate::faults::Fault;
use crate::ledger::{ChannelLedger, PendingTx};
use crate::network::{verify_creator, NetworkState, SimNetwork, SimPeer};
use async_trait::async_trait;
use fc_02_endorsement::PeerGateway;
use fc_04_commit_monitor::{LedgerEventSource, LedgerEventStream};
use shared_bus::EventFilter;
use shared_crypto::{endorsement_digest, sha256, sha256_many};
use shared_types::entities::system_chaincode as scc;
use shared_types::envelope::STATUS_OK;
use shared_types::{
    from_canonical_bytes, to_canonical_bytes, ChaincodeInfo, Endorsement, EndorsementResponse,
    GenesisBlock, Hash, InstalledChaincodes, Invocation, JoinedChannels, PeerEndpoint, Proposal,
    ProposalKind, SignedProposal, SigningIdentity, TransportError,
};
use std::sync::atomic::Ordering;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Status a simulated peer answers with when execution fails.
pub const STATUS_EXECUTION_ERROR: i32 = 500;

struct Execution {
    payload: Vec<u8>,
    rwset: Option<ReadWriteSet>,
}

impl Execution {
    fn empty() -> Self {
        Self {
            payload: Vec::new(),
            rwset: None,
        }
    }
}

#[async_trait]
impl PeerGateway for SimNetwork {
    async fn process_proposal(
        &self,
        peer: &PeerEndpoint,
        proposal: &SignedProposal,
    ) -> Result<EndorsementResponse, TransportError> {
        self.inner.proposals_received.fetch_add(1, Ordering::Relaxed);
        match self.inner.faults.next_fault(&peer.name) {
            Some(Fault::Unreachable) => Err(TransportError::unreachable(&peer.url, "connection refused")),
            Some(Fault::Hang) => std::future::pending().await,
            Some(Fault::Delay(pause)) => {
                sleep(pause).await;
                self.endorse(peer, proposal)
            }
            Some(Fault::Reject { status, message }) => {
                let mut response = self.respond(peer, proposal, Err(message))?;
                response.status = status;
                Ok(response)
            }
            Some(Fault::Diverge) => {
                let mut response = self.endorse(peer, proposal)?;
                response.result_digest = sha256_many(&[&response.result_digest, peer.name.as_bytes()]);
                self.resign(peer, &mut response);
                Ok(response)
            }
            Some(Fault::Impersonate { peer: name, org }) => {
                let mut response = self.endorse(peer, proposal)?;
                response.peer = name;
                response.org = org;
                Ok(response)
            }
            None => self.endorse(peer, proposal),
        }
    }
}

#[async_trait]
impl LedgerEventSource for SimNetwork {
    async fn subscribe(
        &self,
        peer: &PeerEndpoint,
        filter: EventFilter,
    ) -> Result<LedgerEventStream, TransportError> {
        if self.inner.faults.is_down(&peer.name) {
            return Err(TransportError::unreachable(&peer.url, "connection refused"));
        }
        if !self.inner.state.read().peers.contains_key(&peer.name) {
            return Err(TransportError::unreachable(&peer.url, "no such peer"));
        }
        Ok(Box::pin(self.inner.bus.event_stream(filter)))
    }
}

impl SimNetwork {
    fn endorse(
        &self,
        peer: &PeerEndpoint,
        signed: &SignedProposal,
    ) -> Result<EndorsementResponse, TransportError> {
        let proposal = &signed.proposal;
        let chaincode = self.chaincode(&proposal.invocation.chaincode);
        let outcome = {
            let mut state = self.inner.state.write();
            if !state.peers.contains_key(&peer.name) {
                return Err(TransportError::unreachable(&peer.url, "no such peer"));
            }
            let outcome = verify_creator(
                &proposal.signature_header.creator,
                &signed.proposal_bytes,
                &signed.signature,
            )
            .and_then(|_| state.execute(&peer.name, proposal, chaincode.as_ref()));

            if let Ok(Execution { rwset: Some(rwset), .. }) = &outcome {
                if proposal.kind.is_ledger_write() {
                    state.pending.insert(
                        proposal.tx_id().clone(),
                        PendingTx {
                            kind: proposal.kind,
                            chaincode: proposal.invocation.chaincode.clone(),
                            version: proposal.invocation.version.clone(),
                            rwset: rwset.clone(),
                        },
                    );
                }
            }
            outcome
        };
        if let Err(message) = &outcome {
            debug!(peer = %peer.name, kind = proposal.kind.as_str(), %message, "Proposal failed");
        }
        self.respond(peer, signed, outcome)
    }

    /// Sign `response` again after its result digest changed.
    fn resign(&self, peer: &PeerEndpoint, response: &mut EndorsementResponse) {
        if let Some(sim_peer) = self.inner.state.read().peers.get(&peer.name) {
            response.endorsement.signature =
                endorsement_signature(sim_peer, &response.payload_hash, &response.result_digest);
        }
    }

    fn respond(
        &self,
        peer: &PeerEndpoint,
        signed: &SignedProposal,
        outcome: Result<Execution, String>,
    ) -> Result<EndorsementResponse, TransportError> {
        let state = self.inner.state.read();
        let sim_peer = state
            .peers
            .get(&peer.name)
            .ok_or_else(|| TransportError::unreachable(&peer.url, "no such peer"))?;
        Ok(sign_response(sim_peer, signed, outcome))
    }
}

fn sign_response(peer: &SimPeer, signed: &SignedProposal, outcome: Result<Execution, String>) -> EndorsementResponse {
    let payload_hash = sha256(&signed.proposal_bytes);
    let endorser = peer.identity.descriptor().to_bytes().unwrap_or_default();
    let (status, message, payload, result_digest) = match outcome {
        Ok(exec) => {
            let digest = match &exec.rwset {
                Some(rwset) => rwset.digest(&exec.payload),
                None => sha256(&exec.payload),
            };
            (STATUS_OK, String::new(), exec.payload, digest)
        }
        Err(message) => (STATUS_EXECUTION_ERROR, message, Vec::new(), [0; 32]),
    };
    let signature = endorsement_signature(peer, &payload_hash, &result_digest);

    EndorsementResponse {
        peer: peer.endpoint.name.clone(),
        org: peer.endpoint.org.clone(),
        status,
        message,
        payload,
        payload_hash,
        result_digest,
        endorsement: Endorsement { endorser, signature },
    }
}

fn endorsement_signature(peer: &SimPeer, payload_hash: &Hash, result_digest: &Hash) -> Vec<u8> {
    peer.identity
        .sign(&endorsement_digest(payload_hash, result_digest))
        .unwrap_or_else(|e| {
            warn!(peer = %peer.endpoint.name, error = %e, "Endorsement signing failed");
            Vec::new()
        })
}

fn first_arg_str(invocation: &Invocation, what: &str) -> Result<String, String> {
    invocation
        .args
        .first()
        .map(|a| String::from_utf8_lossy(a).into_owned())
        .ok_or_else(|| format!("missing {what} argument"))
}

impl NetworkState {
    fn execute(&mut self, peer: &str, proposal: &Proposal, chaincode: &dyn Chaincode) -> Result<Execution, String> {
        match proposal.kind {
            ProposalKind::JoinChannel => self.join(peer, &proposal.invocation),
            ProposalKind::Install => self.install(peer, &proposal.invocation),
            ProposalKind::Instantiate | ProposalKind::Upgrade => self.deploy(peer, proposal, chaincode),
            ProposalKind::Invoke | ProposalKind::Query => self.run(peer, proposal, chaincode),
            ProposalKind::SystemQuery => self.system_query(peer, &proposal.invocation),
        }
    }

    fn peer(&self, name: &str) -> Result<&SimPeer, String> {
        self.peers.get(name).ok_or_else(|| format!("no such peer {name}"))
    }

    fn joined_ledger(&self, peer: &SimPeer, channel: &str) -> Result<&ChannelLedger, String> {
        if !peer.channels.contains(channel) {
            return Err(format!(
                "peer {} has not joined channel {channel}",
                peer.endpoint.name
            ));
        }
        self.ledgers
            .get(channel)
            .ok_or_else(|| format!("channel {channel} not found"))
    }

    fn join(&mut self, peer: &str, invocation: &Invocation) -> Result<Execution, String> {
        let block = invocation.args.first().ok_or("missing genesis block argument")?;
        let block: GenesisBlock = from_canonical_bytes(block).map_err(|e| e.to_string())?;
        if !self.ledgers.contains_key(&block.channel) {
            return Err(format!("genesis block for unknown channel {}", block.channel));
        }
        let peer = self
            .peers
            .get_mut(peer)
            .ok_or_else(|| format!("no such peer {peer}"))?;
        if !peer.channels.insert(block.channel.clone()) {
            return Err(format!("LedgerID already exists: {}", block.channel));
        }
        debug!(peer = %peer.endpoint.name, channel = %block.channel, "Peer joined channel");
        Ok(Execution::empty())
    }

    fn install(&mut self, peer: &str, invocation: &Invocation) -> Result<Execution, String> {
        let version = invocation
            .version
            .clone()
            .ok_or("chaincode version is required")?;
        let path = first_arg_str(invocation, "chaincode path")?;
        let peer = self
            .peers
            .get_mut(peer)
            .ok_or_else(|| format!("no such peer {peer}"))?;
        if peer.has_installed(&invocation.chaincode, &version) {
            return Err(format!(
                "chaincode {}:{version} already exists",
                invocation.chaincode
            ));
        }
        peer.installed.push(ChaincodeInfo {
            name: invocation.chaincode.clone(),
            version,
            path,
        });
        Ok(Execution::empty())
    }

    fn deploy(&self, peer: &str, proposal: &Proposal, chaincode: &dyn Chaincode) -> Result<Execution, String> {
        let invocation = &proposal.invocation;
        let name = invocation.chaincode.as_str();
        let version = invocation
            .version
            .as_deref()
            .ok_or("chaincode version is required")?;
        let peer = self.peer(peer)?;
        let ledger = self.joined_ledger(peer, proposal.channel())?;
        if !peer.has_installed(name, version) {
            return Err(format!("cannot get package for chaincode ({name}:{version})"));
        }
        match (proposal.kind, ledger.instantiated_version(name)) {
            (ProposalKind::Instantiate, Some(_)) => {
                return Err(format!("chaincode with name '{name}' already exists"))
            }
            (ProposalKind::Upgrade, None) => {
                return Err(format!("cannot upgrade chaincode '{name}': not instantiated"))
            }
            (ProposalKind::Upgrade, Some(current)) if current == version => {
                return Err(format!("version already exists for chaincode with name '{name}'"))
            }
            _ => {}
        }

        let mut ctx = TxContext::new(ledger.state(), name);
        let payload = chaincode.init(&mut ctx, &invocation.fcn, &invocation.args)?;
        Ok(Execution {
            payload,
            rwset: Some(ctx.into_rwset()),
        })
    }

    fn run(&self, peer: &str, proposal: &Proposal, chaincode: &dyn Chaincode) -> Result<Execution, String> {
        let invocation = &proposal.invocation;
        let peer = self.peer(peer)?;
        let ledger = self.joined_ledger(peer, proposal.channel())?;
        if ledger.instantiated_version(&invocation.chaincode).is_none() {
            return Err(format!(
                "chaincode {} is not instantiated on channel {}",
                invocation.chaincode,
                proposal.channel()
            ));
        }
        let mut ctx = TxContext::new(ledger.state(), &invocation.chaincode);
        let payload = chaincode.invoke(&mut ctx, &invocation.fcn, &invocation.args)?;
        Ok(Execution {
            payload,
            rwset: Some(ctx.into_rwset()),
        })
    }

    fn system_query(&self, peer: &str, invocation: &Invocation) -> Result<Execution, String> {
        let peer = self.peer(peer)?;
        let encoded = match (invocation.chaincode.as_str(), invocation.fcn.as_str()) {
            (scc::LIFECYCLE, scc::FCN_INSTALLED) => to_canonical_bytes(&InstalledChaincodes {
                chaincodes: peer.installed.clone(),
            }),
            (scc::CONFIG, scc::FCN_GET_CHANNELS) => to_canonical_bytes(&JoinedChannels {
                channels: peer.channels.iter().cloned().collect(),
            }),
            (scc::QUERY, scc::FCN_GET_CHAIN_INFO) => {
                let channel = first_arg_str(invocation, "channel")?;
                to_canonical_bytes(&self.joined_ledger(peer, &channel)?.chain_info())
            }
            (scc::CONFIG, scc::FCN_GET_CONFIG_BLOCK) => {
                let channel = first_arg_str(invocation, "channel")?;
                to_canonical_bytes(self.joined_ledger(peer, &channel)?.config())
            }
            (cc, fcn) => return Err(format!("unknown system function {cc}/{fcn}")),
        };
        Ok(Execution {
            payload: encoded.map_err(|e| e.to_string())?,
            rwset: None,
        })
    }
}
