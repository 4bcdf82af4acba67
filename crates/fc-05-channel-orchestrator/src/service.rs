//! Channel Orchestrator service.

use crate::config::OrchestratorConfig;
use crate::domain::requests::{
    CreateChannelRequest, DeployRequest, InstallRequest, InvokeRequest, JoinChannelRequest,
    QueryRequest,
};
use crate::domain::results::{
    ChannelCreated, DeployReceipt, InstallReceipt, JoinReceipt, PeerAnswer, QueryResponses,
    TxReceipt,
};
use crate::error::{ClientError, ClientResult};
use crate::ports::inbound::ChannelApi;
use async_trait::async_trait;
use fc_01_proposal::{ProposalBuilder, ProposalBuilderApi, ProposalError};
use fc_02_endorsement::{
    CollectionMode, EndorsementApi, EndorsementError, EndorsementRequest, EndorsementSet,
    FailureReason, PeerFailure,
};
use fc_03_submission::{SubmissionApi, SubmissionError, SubmissionReceipt};
use fc_04_commit_monitor::{CommitMonitorApi, CommitStatus, ReadinessOutcome};
use fc_telemetry::{
    OperationTimer, BROADCAST_ATTEMPTS, COMMIT_OUTCOMES, ENDORSEMENT_RESPONSES, OPERATION_ERRORS,
    PROPOSALS_BUILT,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use shared_types::{
    from_canonical_bytes, system_chaincode, to_canonical_bytes, CallContext, ChainInfo, Channel,
    ChannelConfig, ConfigUpdate, EndorsementPolicy, EndorsementResponse, EndpointRegistry,
    Envelope, InstalledChaincodes, Invocation, JoinedChannels, OrdererEndpoint, PeerEndpoint,
    ProposalKind, SignedProposal, SigningIdentity, TxId,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Endpoints and policy resolved for one ledger write.
#[derive(Debug, Clone)]
struct WritePlan {
    channel: String,
    targets: Vec<PeerEndpoint>,
    orderers: Vec<OrdererEndpoint>,
    event_peers: Vec<PeerEndpoint>,
    policy: EndorsementPolicy,
}

/// Coordinates proposal, endorsement, submission and commit for every
/// facade call.
///
/// Holds only the endpoint registry and the stage services; nothing about
/// an individual call outlives it.
pub struct ChannelOrchestrator<E, S, M>
where
    E: EndorsementApi,
    S: SubmissionApi,
    M: CommitMonitorApi,
{
    config: OrchestratorConfig,
    registry: Arc<RwLock<EndpointRegistry>>,
    builder: ProposalBuilder,
    endorser: Arc<E>,
    submitter: Arc<S>,
    monitor: Arc<M>,
}

impl<E, S, M> ChannelOrchestrator<E, S, M>
where
    E: EndorsementApi,
    S: SubmissionApi,
    M: CommitMonitorApi,
{
    pub fn new(
        config: OrchestratorConfig,
        registry: EndpointRegistry,
        endorser: Arc<E>,
        submitter: Arc<S>,
        monitor: Arc<M>,
    ) -> Self {
        Self {
            config,
            registry: Arc::new(RwLock::new(registry)),
            builder: ProposalBuilder::new(),
            endorser,
            submitter,
            monitor,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// A fresh call context with the configured timeouts and no
    /// cancellation.
    pub fn context(&self) -> CallContext {
        CallContext::new(self.config.call_timeouts())
    }

    /// Copy of the registry as it stands now.
    pub fn registry_snapshot(&self) -> EndpointRegistry {
        self.registry.read().clone()
    }

    pub fn proposals_built(&self) -> u64 {
        self.builder.proposals_built()
    }

    // =========================================================================
    // Endpoint resolution
    // =========================================================================

    fn plan_write(
        &self,
        channel: &str,
        targets: &[String],
        orderers: &[String],
        policy: Option<EndorsementPolicy>,
    ) -> ClientResult<WritePlan> {
        require_channel(channel)?;
        let registry = self.registry.read();
        let ch = registry
            .channel(channel)
            .ok_or_else(|| ClientError::UnknownChannel(channel.to_string()))?;

        let targets = if targets.is_empty() {
            ch.endorsing_peers()
        } else {
            registry.resolve_peers(targets)?
        };
        let orderers = if orderers.is_empty() {
            ch.orderers().to_vec()
        } else {
            registry.resolve_orderers(orderers)?
        };
        if orderers.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "channel {channel} has no orderers"
            )));
        }
        let mut event_peers = ch.event_peers();
        if event_peers.is_empty() {
            event_peers = targets.clone();
        }

        Ok(WritePlan {
            channel: channel.to_string(),
            targets,
            orderers,
            event_peers,
            policy: policy.unwrap_or_else(|| ch.policy().clone()),
        })
    }

    /// Named peers, or the channel peers `keep` selects.
    fn channel_targets(
        &self,
        channel: &str,
        names: &[String],
        keep: impl Fn(&PeerEndpoint) -> bool,
    ) -> ClientResult<Vec<PeerEndpoint>> {
        require_channel(channel)?;
        let registry = self.registry.read();
        let ch = registry
            .channel(channel)
            .ok_or_else(|| ClientError::UnknownChannel(channel.to_string()))?;
        if names.is_empty() {
            Ok(ch.peers().filter(|p| keep(*p)).cloned().collect())
        } else {
            Ok(registry.resolve_peers(names)?)
        }
    }

    /// Named peers, or every peer the registry knows.
    fn any_targets(&self, names: &[String]) -> ClientResult<Vec<PeerEndpoint>> {
        let registry = self.registry.read();
        if names.is_empty() {
            Ok(registry.peers().cloned().collect())
        } else {
            Ok(registry.resolve_peers(names)?)
        }
    }

    // =========================================================================
    // Stage wrappers
    // =========================================================================

    fn build(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        kind: ProposalKind,
        invocation: Invocation,
    ) -> ClientResult<Arc<SignedProposal>> {
        let proposal = self
            .builder
            .build_proposal(requestor, channel, kind, invocation)?;
        PROPOSALS_BUILT.with_label_values(&[kind.as_str()]).inc();
        Ok(Arc::new(proposal))
    }

    async fn endorse(
        &self,
        request: EndorsementRequest,
        ctx: &CallContext,
    ) -> ClientResult<EndorsementSet> {
        let tx_id = request.proposal.tx_id().clone();
        let targets = request.targets.len();
        let result = self.endorser.collect(request, ctx).await;
        record_endorsement(&result);

        let set = result?;
        debug!(
            tx_id = %tx_id.short(),
            accepted = set.accepted.len(),
            failed = set.failed.len(),
            targets,
            "Endorsements collected"
        );
        Ok(set)
    }

    async fn broadcast(
        &self,
        envelope: &Envelope,
        orderers: &[OrdererEndpoint],
        ctx: &CallContext,
    ) -> ClientResult<SubmissionReceipt> {
        let result = self.submitter.submit(envelope, orderers, ctx).await;
        record_broadcast(&result);
        Ok(result?)
    }

    /// Endorse, submit and confirm one ledger write.
    async fn execute_write(
        &self,
        requestor: &dyn SigningIdentity,
        plan: WritePlan,
        kind: ProposalKind,
        invocation: Invocation,
        ready_for: Option<&str>,
        ctx: &CallContext,
    ) -> ClientResult<(TxReceipt, Option<ReadinessOutcome>)> {
        let proposal = self.build(requestor, &plan.channel, kind, invocation)?;
        let tx_id = proposal.tx_id().clone();
        info!(
            tx_id = %tx_id.short(),
            channel = %plan.channel,
            kind = kind.as_str(),
            policy = %plan.policy,
            "Submitting ledger write"
        );

        let set = self
            .endorse(
                EndorsementRequest::new(proposal.clone(), plan.targets.clone(), plan.policy.clone()),
                ctx,
            )
            .await?;
        let envelope = self.submitter.assemble(requestor, &proposal, &set.accepted)?;

        // Subscriptions go up before the broadcast.
        let watch = self
            .monitor
            .watch(&plan.channel, &tx_id, &plan.event_peers)
            .await?;
        let ready_watch = match ready_for {
            Some(chaincode) => match self
                .monitor
                .watch_ready(&plan.channel, chaincode, &plan.event_peers)
                .await
            {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!(chaincode = %chaincode, error = %e, "Readiness subscription failed; not waiting");
                    None
                }
            },
            None => None,
        };

        let submitted = self.broadcast(&envelope, &plan.orderers, ctx).await?;
        info!(
            tx_id = %tx_id.short(),
            orderer = %submitted.orderer,
            attempts = submitted.attempts,
            "Transaction accepted for ordering"
        );

        let outcome = self.monitor.wait(watch, ctx).await?;
        COMMIT_OUTCOMES
            .with_label_values(&[outcome.status.as_str()])
            .inc();

        let receipt = match (outcome.status, outcome.block_number, outcome.validation_code) {
            (CommitStatus::Committed, Some(block_number), Some(validation_code)) => TxReceipt {
                tx_id,
                channel: plan.channel.clone(),
                block_number,
                validation_code,
                orderer: submitted.orderer,
                broadcast_attempts: submitted.attempts,
                endorsers: set.endorsers().map(str::to_string).collect(),
                payload: set.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            },
            (CommitStatus::Invalid, Some(block), Some(code)) => {
                return Err(ClientError::TransactionInvalid { tx_id, code, block });
            }
            _ => {
                warn!(tx_id = %tx_id.short(), channel = %plan.channel, "Commit outcome unknown");
                return Err(ClientError::CommitTimeout {
                    tx_id,
                    channel: plan.channel,
                });
            }
        };

        let readiness = match ready_watch {
            Some(w) => Some(self.monitor.wait_ready(w, ctx).await?),
            None => None,
        };
        Ok((receipt, readiness))
    }

    /// Send a read-only proposal to every target and keep every answer.
    #[allow(clippy::too_many_arguments)]
    async fn read(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        kind: ProposalKind,
        invocation: Invocation,
        targets: Vec<PeerEndpoint>,
        per_peer: bool,
        ctx: &CallContext,
    ) -> ClientResult<(TxId, Vec<EndorsementResponse>)> {
        if targets.is_empty() {
            return Err(ClientError::InvalidRequest("no target peers".into()));
        }
        let proposal = self.build(requestor, channel, kind, invocation)?;
        let tx_id = proposal.tx_id().clone();

        let mut request = EndorsementRequest::new(proposal, targets, EndorsementPolicy::AllTargets)
            .with_mode(CollectionMode::All);
        if per_peer {
            request = request.without_consistency_check();
        }
        let set = self.endorse(request, ctx).await?;
        Ok((tx_id, set.accepted))
    }

    async fn system_query<T: DeserializeOwned>(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        invocation: Invocation,
        targets: Vec<PeerEndpoint>,
        expected: &'static str,
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<T>> {
        let (tx_id, responses) = self
            .read(requestor, channel, ProposalKind::SystemQuery, invocation, targets, true, ctx)
            .await?;
        decode_answers(tx_id, responses, expected)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    async fn run_create_channel(
        &self,
        requestor: &dyn SigningIdentity,
        request: CreateChannelRequest,
        ctx: &CallContext,
    ) -> ClientResult<ChannelCreated> {
        let orderers = {
            let registry = self.registry.read();
            if request.orderers.is_empty() {
                registry.orderers().cloned().collect()
            } else {
                registry.resolve_orderers(&request.orderers)?
            }
        };
        let update = ConfigUpdate {
            channel: request.channel.clone(),
            profile: request.profile,
            organizations: request.organizations,
            config_tx: request.config_tx,
        };
        let envelope = self.builder.build_config_update(requestor, &update)?;
        let tx_id = envelope.tx_id().clone();
        info!(tx_id = %tx_id.short(), channel = %request.channel, "Creating channel");

        let receipt = self.broadcast(&envelope, &orderers, ctx).await?;

        let mut registry = self.registry.write();
        let policy = request
            .policy
            .unwrap_or_else(|| self.config.default_policy.clone());
        registry.new_channel(&request.channel, policy);
        for orderer in &orderers {
            registry.add_orderer_to_channel(&request.channel, &orderer.name)?;
        }
        info!(channel = %request.channel, orderer = %receipt.orderer, "Channel created");

        Ok(ChannelCreated {
            channel: request.channel,
            tx_id,
            orderer: receipt.orderer,
        })
    }

    async fn run_join_channel(
        &self,
        requestor: &dyn SigningIdentity,
        request: JoinChannelRequest,
        ctx: &CallContext,
    ) -> ClientResult<JoinReceipt> {
        require_channel(&request.channel)?;
        if request.peers.is_empty() {
            return Err(ClientError::InvalidRequest(
                "join requires at least one peer".into(),
            ));
        }
        let (peers, orderers) = {
            let registry = self.registry.read();
            let ch = registry
                .channel(&request.channel)
                .ok_or_else(|| ClientError::UnknownChannel(request.channel.clone()))?;
            let orderers = if request.orderers.is_empty() {
                ch.orderers().to_vec()
            } else {
                registry.resolve_orderers(&request.orderers)?
            };
            (registry.resolve_peers(&request.peers)?, orderers)
        };

        let seek = self.builder.build_genesis_seek(requestor, &request.channel)?;
        let genesis = self
            .submitter
            .fetch_genesis_block(&seek, &orderers, ctx)
            .await?;
        debug!(channel = %request.channel, bytes = genesis.data.len(), "Genesis block fetched");

        let block = to_canonical_bytes(&genesis).map_err(ProposalError::from)?;
        let invocation =
            Invocation::new(system_chaincode::CONFIG, system_chaincode::FCN_JOIN_CHAIN).push_arg(block);
        let proposal = self.build(requestor, "", ProposalKind::JoinChannel, invocation)?;
        let tx_id = proposal.tx_id().clone();

        let result = self
            .endorse(
                EndorsementRequest::new(proposal, peers, EndorsementPolicy::AllTargets),
                ctx,
            )
            .await;

        // A peer that accepted the join is a member even when another target failed.
        let joined: Vec<String> = match &result {
            Ok(set) => set.endorsers().map(str::to_string).collect(),
            Err(e) => e.accepted_peers().to_vec(),
        };
        {
            let mut registry = self.registry.write();
            for peer in &joined {
                registry.add_peer_to_channel(&request.channel, peer)?;
            }
        }
        if let Err(e) = result {
            warn!(channel = %request.channel, peers = ?joined, error = %e, "Join incomplete");
            return Err(e);
        }
        info!(channel = %request.channel, peers = ?joined, "Peers joined channel");

        Ok(JoinReceipt {
            channel: request.channel,
            tx_id,
            joined,
        })
    }

    async fn run_install(
        &self,
        requestor: &dyn SigningIdentity,
        request: InstallRequest,
        ctx: &CallContext,
    ) -> ClientResult<InstallReceipt> {
        let targets = match (&request.channel, request.targets.is_empty()) {
            (Some(channel), true) => self.channel_targets(channel, &[], |p| p.roles.endorsing_peer)?,
            (None, true) => {
                return Err(ClientError::InvalidRequest(
                    "install needs target peers or a channel".into(),
                ))
            }
            (_, false) => self.any_targets(&request.targets)?,
        };

        let spec = request.chaincode;
        let invocation = Invocation::new(spec.name.as_str(), system_chaincode::FCN_INSTALL)
            .with_version(spec.version.as_str())
            .with_args([spec.path.as_bytes(), request.package.as_slice()]);
        let proposal = self.build(requestor, "", ProposalKind::Install, invocation)?;
        let tx_id = proposal.tx_id().clone();
        let policy = request.policy.unwrap_or(EndorsementPolicy::AllTargets);

        let set = self
            .endorse(EndorsementRequest::new(proposal, targets, policy), ctx)
            .await?;
        let installed_on: Vec<String> = set.endorsers().map(str::to_string).collect();
        info!(chaincode = %spec.name, version = %spec.version, peers = ?installed_on, "Chaincode installed");

        Ok(InstallReceipt {
            tx_id,
            chaincode: spec.name,
            version: spec.version,
            installed_on,
        })
    }

    async fn run_deploy(
        &self,
        requestor: &dyn SigningIdentity,
        kind: ProposalKind,
        request: DeployRequest,
        ctx: &CallContext,
    ) -> ClientResult<DeployReceipt> {
        let plan = self.plan_write(
            &request.channel,
            &request.targets,
            &request.orderers,
            request.policy,
        )?;
        let fcn = if request.fcn.is_empty() {
            "init".to_string()
        } else {
            request.fcn
        };
        let spec = request.chaincode;
        let invocation = Invocation {
            chaincode: spec.name.clone(),
            version: Some(spec.version.clone()),
            fcn,
            args: request.args,
        };
        let ready_for = self.config.wait_for_ready.then_some(spec.name.as_str());

        let (receipt, readiness) = self
            .execute_write(requestor, plan, kind, invocation, ready_for, ctx)
            .await?;
        match &readiness {
            Some(ReadinessOutcome::Ready { peer, .. }) => {
                info!(chaincode = %spec.name, peer = %peer, "Chaincode ready")
            }
            Some(ReadinessOutcome::TimedOut) => {
                warn!(chaincode = %spec.name, "Chaincode not ready within window")
            }
            None => {}
        }
        Ok(DeployReceipt { receipt, readiness })
    }

    async fn run_invoke(
        &self,
        requestor: &dyn SigningIdentity,
        request: InvokeRequest,
        ctx: &CallContext,
    ) -> ClientResult<TxReceipt> {
        let plan = self.plan_write(
            &request.channel,
            &request.targets,
            &request.orderers,
            request.policy,
        )?;
        let invocation = Invocation::new(request.chaincode, request.fcn).with_args(request.args);
        let (receipt, _) = self
            .execute_write(requestor, plan, ProposalKind::Invoke, invocation, None, ctx)
            .await?;
        info!(
            tx_id = %receipt.tx_id.short(),
            block = receipt.block_number,
            "Transaction committed"
        );
        Ok(receipt)
    }

    async fn run_query(
        &self,
        requestor: &dyn SigningIdentity,
        request: QueryRequest,
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<Vec<u8>>> {
        let targets =
            self.channel_targets(&request.channel, &request.targets, |p| p.roles.chaincode_query)?;
        let invocation = Invocation::new(request.chaincode, request.fcn).with_args(request.args);
        let (tx_id, responses) = self
            .read(requestor, &request.channel, ProposalKind::Query, invocation, targets, false, ctx)
            .await?;
        Ok(QueryResponses::raw(tx_id, responses))
    }
}

#[async_trait]
impl<E, S, M> ChannelApi for ChannelOrchestrator<E, S, M>
where
    E: EndorsementApi + 'static,
    S: SubmissionApi + 'static,
    M: CommitMonitorApi + 'static,
{
    fn new_channel(&self, name: &str, policy: Option<EndorsementPolicy>) -> Channel {
        let policy = policy.unwrap_or_else(|| self.config.default_policy.clone());
        self.registry.write().new_channel(name, policy).clone()
    }

    fn get_channel(&self, name: &str) -> Option<Channel> {
        self.registry.read().channel(name).cloned()
    }

    async fn create_channel(
        &self,
        requestor: &dyn SigningIdentity,
        request: CreateChannelRequest,
        ctx: &CallContext,
    ) -> ClientResult<ChannelCreated> {
        observe("create_channel", ctx, self.run_create_channel(requestor, request, ctx)).await
    }

    async fn join_channel(
        &self,
        requestor: &dyn SigningIdentity,
        request: JoinChannelRequest,
        ctx: &CallContext,
    ) -> ClientResult<JoinReceipt> {
        observe("join_channel", ctx, self.run_join_channel(requestor, request, ctx)).await
    }

    async fn install_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: InstallRequest,
        ctx: &CallContext,
    ) -> ClientResult<InstallReceipt> {
        observe("install_chaincode", ctx, self.run_install(requestor, request, ctx)).await
    }

    async fn instantiate_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: DeployRequest,
        ctx: &CallContext,
    ) -> ClientResult<DeployReceipt> {
        observe(
            "instantiate_chaincode",
            ctx,
            self.run_deploy(requestor, ProposalKind::Instantiate, request, ctx),
        )
        .await
    }

    async fn upgrade_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: DeployRequest,
        ctx: &CallContext,
    ) -> ClientResult<DeployReceipt> {
        observe(
            "upgrade_chaincode",
            ctx,
            self.run_deploy(requestor, ProposalKind::Upgrade, request, ctx),
        )
        .await
    }

    async fn invoke_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: InvokeRequest,
        ctx: &CallContext,
    ) -> ClientResult<TxReceipt> {
        observe("invoke_chaincode", ctx, self.run_invoke(requestor, request, ctx)).await
    }

    async fn query_chaincode(
        &self,
        requestor: &dyn SigningIdentity,
        request: QueryRequest,
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<Vec<u8>>> {
        observe("query_chaincode", ctx, self.run_query(requestor, request, ctx)).await
    }

    async fn query_installed_chaincodes(
        &self,
        requestor: &dyn SigningIdentity,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<InstalledChaincodes>> {
        observe("query_installed_chaincodes", ctx, async {
            let targets = self.any_targets(peers)?;
            let invocation =
                Invocation::new(system_chaincode::LIFECYCLE, system_chaincode::FCN_INSTALLED);
            self.system_query(requestor, "", invocation, targets, "installed chaincodes", ctx)
                .await
        })
        .await
    }

    async fn query_channels(
        &self,
        requestor: &dyn SigningIdentity,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<JoinedChannels>> {
        observe("query_channels", ctx, async {
            let targets = self.any_targets(peers)?;
            let invocation =
                Invocation::new(system_chaincode::CONFIG, system_chaincode::FCN_GET_CHANNELS);
            self.system_query(requestor, "", invocation, targets, "joined channels", ctx)
                .await
        })
        .await
    }

    async fn query_channel_info(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<QueryResponses<ChainInfo>> {
        observe("query_channel_info", ctx, async {
            let targets = self.channel_targets(channel, peers, |p| p.roles.ledger_query)?;
            let invocation =
                Invocation::new(system_chaincode::QUERY, system_chaincode::FCN_GET_CHAIN_INFO)
                    .push_arg(channel);
            self.system_query(requestor, channel, invocation, targets, "chain info", ctx)
                .await
        })
        .await
    }

    async fn get_channel_config(
        &self,
        requestor: &dyn SigningIdentity,
        channel: &str,
        peers: &[String],
        ctx: &CallContext,
    ) -> ClientResult<ChannelConfig> {
        observe("get_channel_config", ctx, async {
            let targets = self.channel_targets(channel, peers, |p| p.roles.ledger_query)?;
            let invocation =
                Invocation::new(system_chaincode::CONFIG, system_chaincode::FCN_GET_CONFIG_BLOCK)
                    .push_arg(channel);
            let proposal = self.build(requestor, channel, ProposalKind::SystemQuery, invocation)?;
            let tx_id = proposal.tx_id().clone();
            let set = self
                .endorse(
                    EndorsementRequest::new(proposal, targets, EndorsementPolicy::any_peers(1)),
                    ctx,
                )
                .await?;
            let answers: QueryResponses<ChannelConfig> =
                decode_answers(tx_id, set.accepted, "channel config")?;
            answers
                .answers
                .into_iter()
                .next()
                .map(|a| a.value)
                .ok_or_else(|| ClientError::InvalidRequest("no peer returned a config block".into()))
        })
        .await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn require_channel(channel: &str) -> ClientResult<()> {
    if channel.trim().is_empty() {
        return Err(ClientError::InvalidRequest("channel name is required".into()));
    }
    Ok(())
}

/// Time the operation and count its failure by kind.
async fn observe<T, F>(operation: &'static str, ctx: &CallContext, fut: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    let _timer = OperationTimer::start(operation);
    let result = if ctx.is_cancelled() {
        Err(ClientError::Cancelled { operation })
    } else {
        fut.await
    };
    if let Err(e) = &result {
        OPERATION_ERRORS
            .with_label_values(&[operation, e.kind().as_str()])
            .inc();
        warn!(operation, kind = %e.kind(), error = %e, "Operation failed");
    }
    result
}

fn decode_answers<T: DeserializeOwned>(
    tx_id: TxId,
    responses: Vec<EndorsementResponse>,
    expected: &'static str,
) -> ClientResult<QueryResponses<T>> {
    let answers = responses
        .into_iter()
        .map(|r| {
            let value = from_canonical_bytes(&r.payload).map_err(|source| {
                ClientError::MalformedResponse {
                    peer: r.peer.clone(),
                    expected,
                    source,
                }
            })?;
            Ok(PeerAnswer {
                peer: r.peer,
                org: r.org,
                value,
            })
        })
        .collect::<ClientResult<Vec<_>>>()?;
    Ok(QueryResponses { tx_id, answers })
}

fn failure_label(reason: &FailureReason) -> &'static str {
    match reason {
        FailureReason::Transport(_) => "unreachable",
        FailureReason::Rejected { .. } => "rejected",
        FailureReason::ForeignResponse { .. } => "foreign",
        FailureReason::InvalidSignature { .. } => "invalid_signature",
    }
}

fn record_failures(failed: &[PeerFailure]) {
    for failure in failed {
        ENDORSEMENT_RESPONSES
            .with_label_values(&[failure_label(&failure.reason)])
            .inc();
    }
}

fn record_endorsement(result: &Result<EndorsementSet, EndorsementError>) {
    match result {
        Ok(set) => {
            ENDORSEMENT_RESPONSES
                .with_label_values(&["accepted"])
                .inc_by(set.accepted.len() as f64);
            ENDORSEMENT_RESPONSES
                .with_label_values(&["unanswered"])
                .inc_by(set.unanswered.len() as f64);
            record_failures(&set.failed);
        }
        Err(e) => record_failures(e.failed_peers()),
    }
}

fn record_broadcast(result: &Result<SubmissionReceipt, SubmissionError>) {
    match result {
        Ok(receipt) => {
            BROADCAST_ATTEMPTS
                .with_label_values(&["unreachable"])
                .inc_by(f64::from(receipt.attempts.saturating_sub(1)));
            BROADCAST_ATTEMPTS.with_label_values(&["accepted"]).inc();
        }
        Err(SubmissionError::OrderingUnavailable { attempts, .. }) => {
            BROADCAST_ATTEMPTS
                .with_label_values(&["unreachable"])
                .inc_by(attempts.len() as f64);
        }
        Err(SubmissionError::Rejected { .. }) => {
            BROADCAST_ATTEMPTS.with_label_values(&["rejected"]).inc();
        }
        Err(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use fc_03_submission::{assemble_transaction, SubmissionResult};
    use fc_04_commit_monitor::{CommitOutcome, CommitResult, CommitWatch, ReadyWatch};
    use parking_lot::Mutex;
    use shared_crypto::{sha256, LocalSigningIdentity};
    use shared_types::{
        cancel_pair, BroadcastAck, ChaincodeInfo, ChaincodeSpec, Endorsement, GenesisBlock,
        Organization, Role, ValidationCode,
    };

    const CHANNEL: &str = "businesschannel";
    const PEER0: &str = "peer0.org1.example.com";
    const PEER1: &str = "peer1.org1.example.com";

    /// Order in which the stages were driven.
    type Journal = Arc<Mutex<Vec<&'static str>>>;

    #[derive(Debug, Clone)]
    struct SeenRequest {
        kind: ProposalKind,
        channel: String,
        policy: EndorsementPolicy,
        mode: CollectionMode,
        check_consistency: bool,
        targets: Vec<String>,
    }

    struct MockEndorser {
        journal: Journal,
        payload: Mutex<Vec<u8>>,
        failure: Mutex<Option<EndorsementError>>,
        seen: Mutex<Vec<SeenRequest>>,
    }

    #[async_trait]
    impl EndorsementApi for MockEndorser {
        async fn collect(
            &self,
            request: EndorsementRequest,
            _ctx: &CallContext,
        ) -> Result<EndorsementSet, EndorsementError> {
            self.journal.lock().push("endorse");
            let proposal = &request.proposal;
            self.seen.lock().push(SeenRequest {
                kind: proposal.proposal.kind,
                channel: proposal.proposal.channel().to_string(),
                policy: request.policy.clone(),
                mode: request.mode,
                check_consistency: request.check_consistency,
                targets: request.targets.iter().map(|t| t.name.clone()).collect(),
            });
            if let Some(e) = self.failure.lock().clone() {
                return Err(e);
            }
            let payload = self.payload.lock().clone();
            let accepted = request
                .targets
                .iter()
                .map(|t| EndorsementResponse {
                    peer: t.name.clone(),
                    org: t.org.clone(),
                    status: 200,
                    message: String::new(),
                    payload: payload.clone(),
                    payload_hash: sha256(&proposal.proposal_bytes),
                    result_digest: [7; 32],
                    endorsement: Endorsement {
                        endorser: t.name.as_bytes().to_vec(),
                        signature: vec![1],
                    },
                })
                .collect();
            Ok(EndorsementSet {
                tx_id: proposal.tx_id().clone(),
                accepted,
                failed: Vec::new(),
                unanswered: Vec::new(),
            })
        }
    }

    struct MockSubmitter {
        journal: Journal,
        failure: Mutex<Option<SubmissionError>>,
        submitted: Mutex<Vec<TxId>>,
    }

    #[async_trait]
    impl SubmissionApi for MockSubmitter {
        fn assemble(
            &self,
            identity: &dyn SigningIdentity,
            proposal: &SignedProposal,
            endorsements: &[EndorsementResponse],
        ) -> SubmissionResult<Envelope> {
            assemble_transaction(identity, proposal, endorsements)
        }

        async fn submit(
            &self,
            envelope: &Envelope,
            orderers: &[OrdererEndpoint],
            _ctx: &CallContext,
        ) -> SubmissionResult<SubmissionReceipt> {
            self.journal.lock().push("submit");
            self.submitted.lock().push(envelope.tx_id().clone());
            if let Some(e) = self.failure.lock().clone() {
                return Err(e);
            }
            Ok(SubmissionReceipt {
                tx_id: envelope.tx_id().clone(),
                orderer: orderers[0].name.clone(),
                attempts: 1,
                ack: BroadcastAck::success(),
            })
        }

        async fn fetch_genesis_block(
            &self,
            seek: &Envelope,
            _orderers: &[OrdererEndpoint],
            _ctx: &CallContext,
        ) -> SubmissionResult<GenesisBlock> {
            self.journal.lock().push("fetch_genesis");
            Ok(GenesisBlock {
                channel: seek.channel().to_string(),
                data: vec![0xB0],
            })
        }
    }

    struct MockMonitor {
        journal: Journal,
        status: Mutex<CommitStatus>,
    }

    #[async_trait]
    impl CommitMonitorApi for MockMonitor {
        async fn watch(
            &self,
            channel: &str,
            tx_id: &TxId,
            _peers: &[PeerEndpoint],
        ) -> CommitResult<CommitWatch> {
            self.journal.lock().push("watch");
            Ok(CommitWatch::new(channel, tx_id.clone(), Vec::new()))
        }

        async fn wait(&self, watch: CommitWatch, _ctx: &CallContext) -> CommitResult<CommitOutcome> {
            self.journal.lock().push("wait");
            let status = *self.status.lock();
            let decided = status != CommitStatus::TimedOut;
            let code = match status {
                CommitStatus::Invalid => ValidationCode::MvccReadConflict,
                _ => ValidationCode::Valid,
            };
            Ok(CommitOutcome {
                tx_id: watch.tx_id,
                status,
                block_number: decided.then_some(4),
                validation_code: decided.then_some(code),
                peer: decided.then(|| PEER0.to_string()),
            })
        }

        async fn watch_ready(
            &self,
            channel: &str,
            chaincode: &str,
            _peers: &[PeerEndpoint],
        ) -> CommitResult<ReadyWatch> {
            self.journal.lock().push("watch_ready");
            Ok(ReadyWatch::new(channel, chaincode, Vec::new()))
        }

        async fn wait_ready(&self, _watch: ReadyWatch, _ctx: &CallContext) -> CommitResult<ReadinessOutcome> {
            self.journal.lock().push("wait_ready");
            Ok(ReadinessOutcome::Ready {
                peer: PEER0.into(),
                version: "v1.0".into(),
            })
        }
    }

    struct Harness {
        journal: Journal,
        endorser: Arc<MockEndorser>,
        submitter: Arc<MockSubmitter>,
        monitor: Arc<MockMonitor>,
        client: ChannelOrchestrator<MockEndorser, MockSubmitter, MockMonitor>,
        admin: LocalSigningIdentity,
    }

    impl Harness {
        fn journal(&self) -> Vec<&'static str> {
            self.journal.lock().clone()
        }

        fn last_request(&self) -> SeenRequest {
            self.endorser.seen.lock().last().cloned().unwrap()
        }
    }

    fn registry() -> EndpointRegistry {
        let mut r = EndpointRegistry::new();
        r.add_organization(Organization::new("org1.example.com", "Org1MSP"));
        r.add_peer(PeerEndpoint::new(PEER0, "org1.example.com", "grpcs://peer0:7051"));
        r.add_peer(PeerEndpoint::new(PEER1, "org1.example.com", "grpcs://peer1:7051"));
        r.add_orderer(OrdererEndpoint::new("orderer.example.com", "grpcs://orderer:7050"));
        r.new_channel(CHANNEL, EndorsementPolicy::any_peers(1));
        r.add_peer_to_channel(CHANNEL, PEER0).unwrap();
        r.add_peer_to_channel(CHANNEL, PEER1).unwrap();
        r.add_orderer_to_channel(CHANNEL, "orderer.example.com").unwrap();
        r
    }

    fn harness() -> Harness {
        let journal: Journal = Arc::default();
        let endorser = Arc::new(MockEndorser {
            journal: journal.clone(),
            payload: Mutex::new(b"90".to_vec()),
            failure: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
        });
        let submitter = Arc::new(MockSubmitter {
            journal: journal.clone(),
            failure: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
        });
        let monitor = Arc::new(MockMonitor {
            journal: journal.clone(),
            status: Mutex::new(CommitStatus::Committed),
        });
        let client = ChannelOrchestrator::new(
            OrchestratorConfig::default(),
            registry(),
            endorser.clone(),
            submitter.clone(),
            monitor.clone(),
        );
        Harness {
            journal,
            endorser,
            submitter,
            monitor,
            client,
            admin: LocalSigningIdentity::generate("org1.example.com", "Org1MSP", "Admin", Role::Admin),
        }
    }

    fn invoke() -> InvokeRequest {
        InvokeRequest::new(CHANNEL, "example_cc", "invoke").with_args(["a", "b", "100"])
    }

    #[tokio::test]
    async fn test_invoke_watches_before_broadcast() {
        let h = harness();
        let receipt = h
            .client
            .invoke_chaincode(&h.admin, invoke(), &h.client.context())
            .await
            .unwrap();

        assert_eq!(h.journal(), vec!["endorse", "watch", "submit", "wait"]);
        assert_eq!(receipt.block_number, 4);
        assert_eq!(receipt.validation_code, ValidationCode::Valid);
        assert_eq!(receipt.orderer, "orderer.example.com");
        assert_eq!(receipt.payload, b"90".to_vec());
        assert_eq!(h.submitter.submitted.lock().as_slice(), &[receipt.tx_id.clone()]);

        let seen = h.last_request();
        assert_eq!(seen.kind, ProposalKind::Invoke);
        assert_eq!(seen.policy, EndorsementPolicy::any_peers(1));
        assert_eq!(seen.mode, CollectionMode::Quorum);
        assert_eq!(seen.targets, vec![PEER0, PEER1]);
    }

    #[tokio::test]
    async fn test_query_never_reaches_submitter() {
        let h = harness();
        let answers = h
            .client
            .query_chaincode(
                &h.admin,
                QueryRequest::new(CHANNEL, "example_cc", "query").with_args(["a"]),
                &h.client.context(),
            )
            .await
            .unwrap();

        assert_eq!(answers.len(), 2);
        assert_eq!(answers.for_peer(PEER1), Some(&b"90".to_vec()));
        assert_eq!(h.journal(), vec!["endorse"]);
        assert!(h.submitter.submitted.lock().is_empty());

        let seen = h.last_request();
        assert_eq!(seen.kind, ProposalKind::Query);
        assert_eq!(seen.mode, CollectionMode::All);
        assert!(seen.check_consistency);
    }

    #[tokio::test]
    async fn test_commit_timeout_is_its_own_kind() {
        let h = harness();
        *h.monitor.status.lock() = CommitStatus::TimedOut;
        let err = h
            .client
            .invoke_chaincode(&h.admin, invoke(), &h.client.context())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommitTimeout);
        assert!(matches!(err, ClientError::CommitTimeout { ref channel, .. } if channel == CHANNEL));
    }

    #[tokio::test]
    async fn test_invalid_transaction_is_not_success() {
        let h = harness();
        *h.monitor.status.lock() = CommitStatus::Invalid;
        let err = h
            .client
            .invoke_chaincode(&h.admin, invoke(), &h.client.context())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::TransactionInvalid {
                code: ValidationCode::MvccReadConflict,
                block: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_endorsement_failure_stops_before_ordering() {
        let h = harness();
        *h.endorser.failure.lock() = Some(EndorsementError::PolicyNotMet {
            policy: "ANY_PEERS(1)".into(),
            accepted: vec![],
            failed: vec![],
        });
        let err = h
            .client
            .invoke_chaincode(&h.admin, invoke(), &h.client.context())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
        assert_eq!(h.journal(), vec!["endorse"]);
    }

    #[tokio::test]
    async fn test_ordering_unavailable_after_watch() {
        let h = harness();
        *h.submitter.failure.lock() = Some(SubmissionError::OrderingUnavailable {
            tx_id: TxId::from_digest(&[0; 32]),
            attempts: vec![],
        });
        let err = h
            .client
            .invoke_chaincode(&h.admin, invoke(), &h.client.context())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrderingUnavailable);
        assert_eq!(h.journal(), vec!["endorse", "watch", "submit"]);
    }

    #[tokio::test]
    async fn test_unknown_channel_fails_without_network() {
        let h = harness();
        let mut request = invoke();
        request.channel = "nochannel".into();
        let err = h
            .client
            .invoke_chaincode(&h.admin, request, &h.client.context())
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::UnknownChannel("nochannel".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(h.journal().is_empty());
        assert_eq!(h.client.proposals_built(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let h = harness();
        let (handle, signal) = cancel_pair();
        handle.cancel();
        let err = h
            .client
            .invoke_chaincode(&h.admin, invoke(), &h.client.context().with_cancel(signal))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(h.journal().is_empty());
    }

    #[tokio::test]
    async fn test_install_defaults_to_every_channel_peer() {
        let h = harness();
        let request = InstallRequest {
            chaincode: ChaincodeSpec::new("example_cc", "v1.0").with_path("github.com/example_cc"),
            package: vec![1, 2, 3],
            channel: Some(CHANNEL.into()),
            ..InstallRequest::default()
        };
        let receipt = h
            .client
            .install_chaincode(&h.admin, request, &h.client.context())
            .await
            .unwrap();

        assert_eq!(receipt.installed_on, vec![PEER0, PEER1]);
        let seen = h.last_request();
        assert_eq!(seen.kind, ProposalKind::Install);
        assert_eq!(seen.policy, EndorsementPolicy::AllTargets);
        assert_eq!(seen.channel, "");
        assert_eq!(h.journal(), vec!["endorse"]);
    }

    #[tokio::test]
    async fn test_install_without_targets_is_invalid() {
        let h = harness();
        let request = InstallRequest {
            chaincode: ChaincodeSpec::new("example_cc", "v1.0"),
            ..InstallRequest::default()
        };
        let err = h
            .client
            .install_chaincode(&h.admin, request, &h.client.context())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_instantiate_waits_for_readiness() {
        let h = harness();
        let request = DeployRequest::new(CHANNEL, ChaincodeSpec::new("example_cc", "v1.0"))
            .with_args(["a", "100", "b", "200"]);
        let deployed = h
            .client
            .instantiate_chaincode(&h.admin, request, &h.client.context())
            .await
            .unwrap();

        assert_eq!(
            h.journal(),
            vec!["endorse", "watch", "watch_ready", "submit", "wait", "wait_ready"]
        );
        assert!(matches!(deployed.readiness, Some(ReadinessOutcome::Ready { .. })));
        assert_eq!(h.last_request().kind, ProposalKind::Instantiate);
    }

    #[tokio::test]
    async fn test_create_then_join_records_membership() {
        let h = harness();
        let created = h
            .client
            .create_channel(
                &h.admin,
                CreateChannelRequest {
                    channel: "mychannel".into(),
                    profile: "TwoOrgsChannel".into(),
                    organizations: vec!["org1.example.com".into()],
                    config_tx: vec![9],
                    ..CreateChannelRequest::default()
                },
                &h.client.context(),
            )
            .await
            .unwrap();
        assert_eq!(created.orderer, "orderer.example.com");
        assert_eq!(
            h.client.get_channel("mychannel").unwrap().orderers().len(),
            1
        );

        let joined = h
            .client
            .join_channel(
                &h.admin,
                JoinChannelRequest {
                    channel: "mychannel".into(),
                    peers: vec![PEER0.into()],
                    orderers: vec![],
                },
                &h.client.context(),
            )
            .await
            .unwrap();

        assert_eq!(joined.joined, vec![PEER0]);
        assert!(h.client.get_channel("mychannel").unwrap().contains_peer(PEER0));
        assert_eq!(h.journal(), vec!["submit", "fetch_genesis", "endorse"]);
        assert_eq!(h.last_request().kind, ProposalKind::JoinChannel);
    }

    #[tokio::test]
    async fn test_partial_join_records_peers_that_joined() {
        let h = harness();
        h.client
            .create_channel(
                &h.admin,
                CreateChannelRequest {
                    channel: "mychannel".into(),
                    profile: "TwoOrgsChannel".into(),
                    organizations: vec!["org1.example.com".into()],
                    config_tx: vec![9],
                    ..CreateChannelRequest::default()
                },
                &h.client.context(),
            )
            .await
            .unwrap();
        *h.endorser.failure.lock() = Some(EndorsementError::PolicyNotMet {
            policy: "ALL_TARGETS".into(),
            accepted: vec![PEER0.into()],
            failed: vec![PeerFailure {
                peer: PEER1.into(),
                org: "org1.example.com".into(),
                reason: FailureReason::Rejected {
                    status: 500,
                    message: "already joined".into(),
                },
            }],
        });

        let err = h
            .client
            .join_channel(
                &h.admin,
                JoinChannelRequest {
                    channel: "mychannel".into(),
                    peers: vec![PEER0.into(), PEER1.into()],
                    orderers: vec![],
                },
                &h.client.context(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
        assert_eq!(err.accepted_peers(), &[PEER0.to_string()]);
        let channel = h.client.get_channel("mychannel").unwrap();
        assert!(channel.contains_peer(PEER0));
        assert!(!channel.contains_peer(PEER1));
    }

    #[tokio::test]
    async fn test_join_unknown_channel() {
        let h = harness();
        let err = h
            .client
            .join_channel(
                &h.admin,
                JoinChannelRequest {
                    channel: "ghost".into(),
                    peers: vec![PEER0.into()],
                    orderers: vec![],
                },
                &h.client.context(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::UnknownChannel("ghost".into()));
    }

    #[tokio::test]
    async fn test_installed_chaincodes_are_decoded_per_peer() {
        let h = harness();
        let installed = InstalledChaincodes {
            chaincodes: vec![ChaincodeInfo {
                name: "example_cc".into(),
                version: "v1.0".into(),
                path: "github.com/example_cc".into(),
            }],
        };
        *h.endorser.payload.lock() = to_canonical_bytes(&installed).unwrap();

        let answers = h
            .client
            .query_installed_chaincodes(&h.admin, &[PEER0.to_string()], &h.client.context())
            .await
            .unwrap();
        assert_eq!(answers.for_peer(PEER0), Some(&installed));

        let seen = h.last_request();
        assert_eq!(seen.kind, ProposalKind::SystemQuery);
        assert!(!seen.check_consistency);
        assert_eq!(seen.targets, vec![PEER0]);
    }

    #[tokio::test]
    async fn test_malformed_system_answer() {
        let h = harness();
        *h.endorser.payload.lock() = vec![0xFF];
        let err = h
            .client
            .query_channel_info(&h.admin, CHANNEL, &[], &h.client.context())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse { expected: "chain info", .. }));
    }

    #[tokio::test]
    async fn test_new_channel_is_idempotent() {
        let h = harness();
        let first = h.client.new_channel("declared", None);
        let again = h.client.new_channel("declared", Some(EndorsementPolicy::AllTargets));
        assert_eq!(first, again);
        assert_eq!(first.policy(), &EndorsementPolicy::default());
        assert!(h.client.get_channel("missing").is_none());
    }
}
