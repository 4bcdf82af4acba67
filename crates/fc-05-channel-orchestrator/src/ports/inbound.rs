//! # Inbound Ports (Driving Ports / API)

use crate::domain::requests::{
    CreateChannelRequest, DeployRequest, InstallRequest, InvokeRequest, JoinChannelRequest,
    QueryRequest,
};
use crate::domain::results::{
    ChannelCreated, DeployReceipt, InstallReceipt, JoinReceipt, QueryResponses, TxReceipt,
};
use crate::error::ClientResult;
use async_trait::async_trait;
use shared_types::{
    CallContext, ChainInfo, Channel, ChannelConfig, EndorsementPolicy, InstalledChaincodes,
    JoinedChannels, SigningIdentity,
};

/// The channel client facade. One call per logical action; every call owns
/// its proposal, responses, envelope and outcome.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Declare a channel created elsewhere so later calls can address it.
    fn new_channel(&self, name: &str, policy: Option<EndorsementPolicy>) -> Channel;

    /// Snapshot of a known channel.
    fn get_channel(&self, name: &str) -> Option<Channel>;

    async fn create_channel(
        &self,
        requestor: &dyn SigningIdentity,
        request: CreateChannelRequest,
        ctx: &CallContext,
    ) -> ClientResult<ChannelCreated>;

    async fn join_channel(
        &self,
        requestor: &dyn SigningIdentity,
        request: JoinChannelRequest,
        ctx: &CallContext,
    ) -> ClientResult<JoinReceipt>;

    async fn install_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: InstallRequest,
        ctx: &CallContext,
    ) -> ClientResult<InstallReceipt>;

    async fn instantiate_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: DeployRequest,
        ctx: &CallContext,
    ) -> ClientResult<DeployReceipt>;

    async fn upgrade_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: DeployRequest,
        ctx: &CallContext,
    ) -> ClientResult<DeployReceipt>;

    async fn invoke_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: InvokeRequest,
        ctx: &CallContext,
    ) -> ClientResult<TxReceipt>;

    /// Read-only; never reaches an orderer.
    async fn query_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: QueryRequest,
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<Vec<u8>>>;

    async fn query_installed_chaincodes(
        &self,
        requestor: &dyn SigningIdentity,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<InstalledChaincodes>>;

    async fn query_channels(
        &self,
        requestor: &dyn SigningIdentity,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<JoinedChannels>>;

    /// Ledger height and tip hashes as seen by each peer.
    async fn query_channel_info(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<ChainInfo>>;

    /// Latest configuration block, read from the first reachable peer.
    async fn get_channel_config(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<ChannelConfig>;
}
