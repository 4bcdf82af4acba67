//! # Sample Scenarios
//!
//! Two walkthroughs of the client facade against `businesschannel`:
//!
//! - **Full**: create the channel, join both organizations' peers, install
//!   and instantiate `example_cc`, move 100 from `a` to `b` and read `b`
//!   back, then run every ledger query.
//! - **Query-only**: the channel already exists with `example_cc`
//!   deployed; a regular user runs the read paths and one invoke.
//!
//! Each step is recorded so callers can print or assert on the run.

use anyhow::{bail, ensure, Context, Result};
use fc_05_channel_orchestrator::{
    ChannelApi, CreateChannelRequest, DeployRequest, InstallRequest, InvokeRequest,
    JoinChannelRequest, QueryRequest,
};
use network_sim::SimNetwork;
use shared_types::{CallContext, ChaincodeSpec, IdentityProvider, SigningIdentity};
use std::sync::Arc;
use tracing::info;

use crate::profile::NetworkProfile;
use crate::settings::Scenario;

pub const CHANNEL: &str = "businesschannel";
pub const CHAINCODE: &str = "example_cc";
pub const CHAINCODE_VERSION: &str = "1.0";
pub const CHAINCODE_PATH: &str = "github.com/example_cc";

const ORG1: &str = "org1.example.com";
const ORG2: &str = "org2.example.com";
const PEER0_ORG1: &str = "peer0.org1.example.com";
const PEER1_ORG1: &str = "peer1.org1.example.com";
const PEER0_ORG2: &str = "peer0.org2.example.com";
const PEER1_ORG2: &str = "peer1.org2.example.com";

/// Balances set by instantiation.
const INIT_ARGS: [&str; 4] = ["a", "200", "b", "300"];
/// Balance of `b` after one `a b 100` move.
const EXPECTED_B: &str = "400";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: &'static str,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioReport {
    pub steps: Vec<StepRecord>,
}

impl ScenarioReport {
    fn record(&mut self, step: &'static str, summary: impl Into<String>) {
        let summary = summary.into();
        info!(step, %summary, "Step complete");
        self.steps.push(StepRecord { step, summary });
    }

    pub fn step(&self, step: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.step == step)
    }
}

/// Put the simulated network in the state `scenario` starts from.
pub fn prepare_network(network: &SimNetwork, profile: &NetworkProfile, scenario: Scenario) -> Result<()> {
    if scenario == Scenario::Full {
        return Ok(());
    }
    let channel = profile
        .channels
        .get(CHANNEL)
        .with_context(|| format!("profile does not declare {CHANNEL}"))?;
    let orgs: Vec<&str> = profile.organizations.keys().map(String::as_str).collect();
    let peers: Vec<&str> = channel.peers.iter().map(String::as_str).collect();
    network
        .bootstrap_channel(CHANNEL, &orgs, &peers)
        .context("bootstrap channel")?;
    network
        .preload_chaincode(CHANNEL, CHAINCODE, CHAINCODE_VERSION, &INIT_ARGS)
        .context("preload chaincode")?;
    Ok(())
}

pub struct ScenarioRunner<'a, C: ChannelApi> {
    client: &'a C,
    identities: &'a dyn IdentityProvider,
    ctx: CallContext,
}

impl<'a, C: ChannelApi> ScenarioRunner<'a, C> {
    pub fn new(client: &'a C, identities: &'a dyn IdentityProvider, ctx: CallContext) -> Self {
        Self {
            client,
            identities,
            ctx,
        }
    }

    fn user(&self, org: &str, name: &str) -> Result<Arc<dyn SigningIdentity>> {
        self.identities
            .get_user(org, name)
            .with_context(|| format!("no identity {name}@{org} in profile"))
    }

    pub async fn run(&self, scenario: Scenario) -> Result<ScenarioReport> {
        match scenario {
            Scenario::Full => self.run_full().await,
            Scenario::QueryOnly => self.run_query_only().await,
        }
    }

    async fn run_full(&self) -> Result<ScenarioReport> {
        let mut report = ScenarioReport::default();
        let org1_admin = self.user(ORG1, "Admin")?;
        let org2_admin = self.user(ORG2, "Admin")?;

        let created = self
            .client
            .create_channel(
                org1_admin.as_ref(),
                CreateChannelRequest {
                    channel: CHANNEL.into(),
                    profile: "TwoOrgsChannel".into(),
                    organizations: vec![ORG1.into(), ORG2.into()],
                    ..CreateChannelRequest::default()
                },
                &self.ctx,
            )
            .await
            .context("create channel")?;
        report.record("create_channel", format!("{} via {}", created.channel, created.orderer));

        for (admin, peers) in [
            (&org1_admin, [PEER0_ORG1, PEER1_ORG1]),
            (&org2_admin, [PEER0_ORG2, PEER1_ORG2]),
        ] {
            let joined = self
                .client
                .join_channel(
                    admin.as_ref(),
                    JoinChannelRequest {
                        channel: CHANNEL.into(),
                        peers: peers.iter().map(|p| p.to_string()).collect(),
                        orderers: Vec::new(),
                    },
                    &self.ctx,
                )
                .await
                .with_context(|| format!("join {}", admin.descriptor().org))?;
            report.record("join_channel", joined.joined.join(", "));
        }

        let installed = self
            .client
            .install_chaincode(
                org1_admin.as_ref(),
                InstallRequest {
                    chaincode: ChaincodeSpec::new(CHAINCODE, CHAINCODE_VERSION)
                        .with_path(CHAINCODE_PATH),
                    package: CHAINCODE_PATH.as_bytes().to_vec(),
                    targets: vec![PEER0_ORG1.into(), PEER1_ORG1.into()],
                    ..InstallRequest::default()
                },
                &self.ctx,
            )
            .await
            .context("install chaincode")?;
        report.record(
            "install_chaincode",
            format!(
                "{}:{} on {}",
                installed.chaincode,
                installed.version,
                installed.installed_on.join(", ")
            ),
        );

        let mut deploy = DeployRequest::new(CHANNEL, ChaincodeSpec::new(CHAINCODE, CHAINCODE_VERSION))
            .with_args(INIT_ARGS);
        deploy.targets = vec![PEER0_ORG1.into()];
        let deployed = self
            .client
            .instantiate_chaincode(org1_admin.as_ref(), deploy, &self.ctx)
            .await
            .context("instantiate chaincode")?;
        report.record(
            "instantiate_chaincode",
            format!(
                "block {} readiness {:?}",
                deployed.receipt.block_number, deployed.readiness
            ),
        );

        self.move_and_read(org1_admin.as_ref(), &mut report).await?;
        self.ledger_queries(org1_admin.as_ref(), &mut report).await?;
        Ok(report)
    }

    async fn run_query_only(&self) -> Result<ScenarioReport> {
        let mut report = ScenarioReport::default();
        let user = self.user(ORG1, "User1")?;
        let peers = [PEER0_ORG1.to_string()];

        let installed = self
            .client
            .query_installed_chaincodes(user.as_ref(), &peers, &self.ctx)
            .await
            .context("query installed chaincodes")?;
        let names: Vec<String> = installed
            .first()
            .map(|i| i.chaincodes.iter().map(|c| format!("{}:{}", c.name, c.version)).collect())
            .unwrap_or_default();
        report.record("query_installed_chaincodes", names.join(", "));

        let channels = self
            .client
            .query_channels(user.as_ref(), &peers, &self.ctx)
            .await
            .context("query channels")?;
        let joined = channels.first().map(|c| c.channels.join(", ")).unwrap_or_default();
        report.record("query_channels", joined);

        let known = self.client.get_channel(CHANNEL).is_some();
        let declared = self.client.new_channel(CHANNEL, None);
        report.record(
            "new_channel",
            format!("{} (known before: {known}, peers: {})", declared.name(), declared.peers().count()),
        );

        self.ledger_info(user.as_ref(), &peers, &mut report).await?;
        self.move_and_read(user.as_ref(), &mut report).await?;
        Ok(report)
    }

    /// Invoke `a b 100` and check that `b` now reads 400.
    async fn move_and_read(&self, requestor: &dyn SigningIdentity, report: &mut ScenarioReport) -> Result<()> {
        let receipt = self
            .client
            .invoke_chaincode(
                requestor,
                InvokeRequest::new(CHANNEL, CHAINCODE, "invoke")
                    .with_args(["a", "b", "100"])
                    .with_targets([PEER0_ORG1]),
                &self.ctx,
            )
            .await
            .context("invoke chaincode")?;
        report.record(
            "invoke_chaincode",
            format!(
                "{} {} in block {}",
                receipt.tx_id.short(),
                receipt.validation_code,
                receipt.block_number
            ),
        );

        let answers = self
            .client
            .query_chaincode(
                requestor,
                QueryRequest::new(CHANNEL, CHAINCODE, "query")
                    .with_args(["b"])
                    .with_targets([PEER0_ORG1]),
                &self.ctx,
            )
            .await
            .context("query chaincode")?;
        let value = answers
            .first()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .context("query returned no answers")?;
        ensure!(value == EXPECTED_B, "expected b = {EXPECTED_B}, got {value}");
        report.record("query_chaincode", format!("b = {value}"));
        Ok(())
    }

    async fn ledger_queries(&self, requestor: &dyn SigningIdentity, report: &mut ScenarioReport) -> Result<()> {
        let peers = [PEER0_ORG1.to_string()];
        let installed = self
            .client
            .query_installed_chaincodes(requestor, &peers, &self.ctx)
            .await
            .context("query installed chaincodes")?;
        let Some(list) = installed.first() else {
            bail!("no answer to installed chaincode query");
        };
        report.record(
            "query_installed_chaincodes",
            list.chaincodes
                .iter()
                .map(|c| format!("{}:{}", c.name, c.version))
                .collect::<Vec<_>>()
                .join(", "),
        );

        let channels = self
            .client
            .query_channels(requestor, &peers, &self.ctx)
            .await
            .context("query channels")?;
        report.record(
            "query_channels",
            channels.first().map(|c| c.channels.join(", ")).unwrap_or_default(),
        );

        self.ledger_info(requestor, &peers, report).await
    }

    async fn ledger_info(
        &self,
        requestor: &dyn SigningIdentity,
        peers: &[String],
        report: &mut ScenarioReport,
    ) -> Result<()> {
        let info = self
            .client
            .query_channel_info(requestor, CHANNEL, peers, &self.ctx)
            .await
            .context("query channel info")?;
        let Some(chain) = info.first() else {
            bail!("no answer to channel info query");
        };
        report.record(
            "query_channel_info",
            format!(
                "height {} tip {}",
                chain.height,
                hex::encode(&chain.current_block_hash[..8])
            ),
        );

        let config = self
            .client
            .get_channel_config(requestor, CHANNEL, peers, &self.ctx)
            .await
            .context("get channel config")?;
        report.record(
            "get_channel_config",
            format!(
                "sequence {} orgs [{}] orderers [{}]",
                config.sequence,
                config.organizations.join(", "),
                config.orderers.join(", ")
            ),
        );
        Ok(())
    }
}
