//! # Inbound Ports (Driving Ports / API)

use crate::error::SubmissionResult;
use async_trait::async_trait;
use shared_types::{
    BroadcastAck, CallContext, EndorsementResponse, Envelope, GenesisBlock, OrdererEndpoint,
    SignedProposal, SigningIdentity, TxId,
};

/// Proof that an orderer accepted an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub tx_id: TxId,
    /// Orderer that accepted the envelope.
    pub orderer: String,
    /// Attempts spent, including the successful one.
    pub attempts: u32,
    pub ack: BroadcastAck,
}

/// Primary Transaction Submitter API.
#[async_trait]
pub trait SubmissionApi: Send + Sync {
    /// Build the signed transaction envelope for an endorsed proposal.
    fn assemble(
        &self,
        identity: &dyn SigningIdentity,
        proposal: &SignedProposal,
        endorsements: &[EndorsementResponse],
    ) -> SubmissionResult<Envelope>;

    /// Broadcast `envelope`, cycling through `orderers` under the retry policy.
    async fn submit(
        &self,
        envelope: &Envelope,
        orderers: &[OrdererEndpoint],
        ctx: &CallContext,
    ) -> SubmissionResult<SubmissionReceipt>;

    /// Fetch a channel's genesis block under the same retry policy.
    async fn fetch_genesis_block(
        &self,
        seek: &Envelope,
        orderers: &[OrdererEndpoint],
        ctx: &CallContext,
    ) -> SubmissionResult<GenesisBlock>;
}
