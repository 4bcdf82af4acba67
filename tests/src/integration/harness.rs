//! Test fixture: the sample two-org network, a simulated backend and a
//! client wired to it.

use client_runtime::{build_client, NetworkProfile, SimChannelClient};
use fc_05_channel_orchestrator::OrchestratorConfig;
use network_sim::{SimConfig, SimNetwork};
use shared_crypto::LocalIdentityStore;
use shared_types::{CallContext, IdentityProvider, SigningIdentity};
use std::sync::Arc;
use std::time::Duration;

pub const CHANNEL: &str = "businesschannel";
pub const EXAMPLE_CC: &str = "example_cc";
pub const ORG1: &str = "org1.example.com";
pub const ORG2: &str = "org2.example.com";
pub const ORDERER: &str = "orderer.example.com";
pub const PEER0_ORG1: &str = "peer0.org1.example.com";
pub const PEER1_ORG1: &str = "peer1.org1.example.com";
pub const PEER0_ORG2: &str = "peer0.org2.example.com";
pub const PEER1_ORG2: &str = "peer1.org2.example.com";

pub struct Harness {
    pub profile: NetworkProfile,
    pub network: SimNetwork,
    pub client: SimChannelClient,
    pub identities: LocalIdentityStore,
}

impl Harness {
    /// Sample network with short block and retry delays. No channel exists
    /// on the backend yet.
    pub fn new() -> Self {
        Self::with(Self::fast_sim(), |_| {})
    }

    pub fn fast_sim() -> SimConfig {
        SimConfig {
            block_delay: Duration::from_millis(5),
            ready_delay: Duration::from_millis(5),
        }
    }

    pub fn with(sim: SimConfig, configure: impl FnOnce(&mut OrchestratorConfig)) -> Self {
        let mut profile = NetworkProfile::sample();
        profile.client.retry.backoff = Duration::from_millis(10);
        profile.client.timeouts.commit_ms = 2_000;
        profile.client.timeouts.endorsement_ms = 2_000;
        profile.client.timeouts.ready_ms = 2_000;
        configure(&mut profile.client);
        Self::from_profile(profile, sim)
    }

    pub fn from_profile(profile: NetworkProfile, sim: SimConfig) -> Self {
        let registry = profile.registry().unwrap();
        let network = SimNetwork::from_registry(&registry, sim);
        let client = build_client(profile.client.clone(), registry, &network);
        let identities = profile.identities().unwrap();
        Self {
            profile,
            network,
            client,
            identities,
        }
    }

    /// `businesschannel` with every peer joined and `example_cc` 1.0
    /// instantiated with a=200, b=300.
    pub fn deployed() -> Self {
        Self::new().with_deployed_channel()
    }

    pub fn with_deployed_channel(self) -> Self {
        self.network
            .bootstrap_channel(
                CHANNEL,
                &[ORG1, ORG2],
                &[PEER0_ORG1, PEER1_ORG1, PEER0_ORG2, PEER1_ORG2],
            )
            .unwrap();
        self.network
            .preload_chaincode(CHANNEL, EXAMPLE_CC, "1.0", &["a", "200", "b", "300"])
            .unwrap();
        self
    }

    pub fn admin(&self, org: &str) -> Arc<dyn SigningIdentity> {
        self.identities.get_user(org, "Admin").unwrap()
    }

    pub fn user(&self, org: &str) -> Arc<dyn SigningIdentity> {
        self.identities.get_user(org, "User1").unwrap()
    }

    pub fn ctx(&self) -> CallContext {
        self.client.context()
    }

    pub fn balance(&self, key: &str) -> Option<String> {
        self.network.state_value(CHANNEL, EXAMPLE_CC, key)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
