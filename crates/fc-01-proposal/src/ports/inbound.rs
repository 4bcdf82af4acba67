//! # Inbound Ports (Driving Ports / API)

use crate::error::ProposalResult;
use shared_types::{ConfigUpdate, Envelope, Invocation, ProposalKind, SignedProposal, SigningIdentity};

/// Primary Proposal Builder API.
///
/// Building is synchronous and side-effect free apart from drawing a nonce.
pub trait ProposalBuilderApi: Send + Sync {
    /// Build and sign a proposal.
    ///
    /// `channel` is empty for channel-less proposals (install, joined-channel
    /// queries, channel join).
    fn build_proposal(
        &self,
        identity: &dyn SigningIdentity,
        channel: &str,
        kind: ProposalKind,
        invocation: Invocation,
    ) -> ProposalResult<SignedProposal>;

    /// Build the signed config-update envelope that creates a channel.
    fn build_config_update(
        &self,
        identity: &dyn SigningIdentity,
        update: &ConfigUpdate,
    ) -> ProposalResult<Envelope>;

    /// Build the signed deliver request for a channel's genesis block.
    fn build_genesis_seek(
        &self,
        identity: &dyn SigningIdentity,
        channel: &str,
    ) -> ProposalResult<Envelope>;
}
