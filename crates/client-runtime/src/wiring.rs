//! Assembles the channel client on top of the in-process network.

use fc_02_endorsement::{EndorsementService, PeerKeyring};
use fc_03_submission::SubmissionService;
use fc_04_commit_monitor::CommitMonitorService;
use fc_05_channel_orchestrator::{ChannelOrchestrator, OrchestratorConfig};
use network_sim::SimNetwork;
use shared_types::EndpointRegistry;
use std::sync::Arc;

/// The client as wired against [`SimNetwork`]: one network handle serves as
/// peer gateway, orderer gateway and event source. Endorsements are checked
/// against the peer identities the network publishes.
pub type SimChannelClient = ChannelOrchestrator<
    EndorsementService<SimNetwork, PeerKeyring>,
    SubmissionService<SimNetwork>,
    CommitMonitorService<SimNetwork>,
>;

pub fn build_client(
    config: OrchestratorConfig,
    registry: EndpointRegistry,
    network: &SimNetwork,
) -> SimChannelClient {
    let gateway = Arc::new(network.clone());
    let retry = config.retry;
    let keyring = Arc::new(network.peer_keyring());
    ChannelOrchestrator::new(
        config,
        registry,
        Arc::new(EndorsementService::new(Arc::clone(&gateway), keyring)),
        Arc::new(SubmissionService::new(Arc::clone(&gateway), retry)),
        Arc::new(CommitMonitorService::new(gateway)),
    )
}
