//! Proposal Builder service.

use crate::domain::validation::{target_chaincode, validate_request};
use crate::error::{ProposalError, ProposalResult};
use crate::ports::inbound::ProposalBuilderApi;
use shared_crypto::{compute_tx_id, generate_nonce};
use shared_types::{
    to_canonical_bytes, ChannelHeader, ConfigUpdate, Envelope, EnvelopePayload, HeaderKind,
    Invocation, Proposal, ProposalKind, SeekRange, SignatureHeader, SignedProposal, SigningIdentity,
    TxId,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Builds signed proposals and envelopes for one client.
///
/// Holds no per-call state; a single instance is shared by every concurrent
/// operation.
#[derive(Debug, Default)]
pub struct ProposalBuilder {
    proposals_built: AtomicU64,
}

impl ProposalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total proposals successfully built by this instance.
    pub fn proposals_built(&self) -> u64 {
        self.proposals_built.load(Ordering::Relaxed)
    }

    fn ensure_can_sign(identity: &dyn SigningIdentity) -> ProposalResult<()> {
        if identity.can_sign() {
            return Ok(());
        }
        let d = identity.descriptor();
        Err(ProposalError::NoSigningCapability {
            name: d.name.clone(),
            org: d.org.clone(),
        })
    }

    /// Fresh nonce, creator bytes and the transaction ID bound to both.
    fn signature_header(identity: &dyn SigningIdentity) -> ProposalResult<(SignatureHeader, TxId)> {
        let creator = identity.descriptor().to_bytes()?;
        let nonce = generate_nonce();
        let tx_id = compute_tx_id(&nonce, &creator);
        Ok((
            SignatureHeader {
                creator,
                nonce: nonce.to_vec(),
            },
            tx_id,
        ))
    }

    fn seal(
        identity: &dyn SigningIdentity,
        kind: HeaderKind,
        channel: &str,
        data: Vec<u8>,
    ) -> ProposalResult<Envelope> {
        Self::ensure_can_sign(identity)?;
        let (signature_header, tx_id) = Self::signature_header(identity)?;
        let header = ChannelHeader {
            kind,
            channel: channel.to_string(),
            tx_id,
            timestamp: unix_now(),
        };
        let payload = EnvelopePayload {
            header: header.clone(),
            signature_header,
            data,
        };
        let payload_bytes = to_canonical_bytes(&payload)?;
        let signature = identity.sign(&payload_bytes)?;
        Ok(Envelope {
            header,
            payload_bytes,
            signature,
        })
    }
}

impl ProposalBuilderApi for ProposalBuilder {
    fn build_proposal(
        &self,
        identity: &dyn SigningIdentity,
        channel: &str,
        kind: ProposalKind,
        invocation: Invocation,
    ) -> ProposalResult<SignedProposal> {
        validate_request(channel, kind, &invocation)?;
        Self::ensure_can_sign(identity)?;

        let (signature_header, tx_id) = Self::signature_header(identity)?;
        let proposal = Proposal {
            header: ChannelHeader {
                kind: HeaderKind::EndorserTransaction,
                channel: channel.to_string(),
                tx_id,
                timestamp: unix_now(),
            },
            signature_header,
            kind,
            invocation,
        };
        let proposal_bytes = to_canonical_bytes(&proposal)?;
        let signature = identity.sign(&proposal_bytes)?;

        self.proposals_built.fetch_add(1, Ordering::Relaxed);
        debug!(
            tx_id = %proposal.tx_id().short(),
            channel = %channel,
            kind = kind.as_str(),
            target = target_chaincode(kind, &proposal.invocation),
            "Proposal built"
        );

        Ok(SignedProposal {
            proposal,
            proposal_bytes,
            signature,
        })
    }

    fn build_config_update(
        &self,
        identity: &dyn SigningIdentity,
        update: &ConfigUpdate,
    ) -> ProposalResult<Envelope> {
        if update.channel.trim().is_empty() {
            return Err(ProposalError::MissingChannel);
        }
        let data = to_canonical_bytes(update)?;
        let envelope = Self::seal(identity, HeaderKind::ConfigUpdate, &update.channel, data)?;
        debug!(channel = %update.channel, profile = %update.profile, "Config update envelope built");
        Ok(envelope)
    }

    fn build_genesis_seek(
        &self,
        identity: &dyn SigningIdentity,
        channel: &str,
    ) -> ProposalResult<Envelope> {
        if channel.trim().is_empty() {
            return Err(ProposalError::MissingChannel);
        }
        let data = to_canonical_bytes(&SeekRange::GENESIS)?;
        Self::seal(identity, HeaderKind::DeliverSeek, channel, data)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
