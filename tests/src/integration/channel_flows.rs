//! # Channel Lifecycle Flows
//!
//! Every facade operation end to end against the simulated network:
//!
//! ```text
//! create_channel → join_channel (per org) → install → instantiate
//!     → invoke → query → install v2 → upgrade → ledger queries
//! ```

use super::harness::*;
use fc_04_commit_monitor::ReadinessOutcome;
use fc_05_channel_orchestrator::{
    ChannelApi, CreateChannelRequest, DeployRequest, ErrorKind, InstallRequest, InvokeRequest,
    JoinChannelRequest, QueryRequest,
};
use shared_types::{ChaincodeSpec, EndorsementPolicy, SigningIdentity, ValidationCode};

fn install(version: &str, targets: &[&str]) -> InstallRequest {
    InstallRequest {
        chaincode: ChaincodeSpec::new(EXAMPLE_CC, version).with_path("github.com/example_cc"),
        package: b"example_cc package".to_vec(),
        targets: targets.iter().map(|t| t.to_string()).collect(),
        ..InstallRequest::default()
    }
}

fn join(peers: &[&str]) -> JoinChannelRequest {
    JoinChannelRequest {
        channel: CHANNEL.into(),
        peers: peers.iter().map(|p| p.to_string()).collect(),
        orderers: Vec::new(),
    }
}

async fn query_b(h: &Harness, requestor: &dyn SigningIdentity, targets: &[&str]) -> String {
    let answers = h
        .client
        .query_chaincode(
            requestor,
            QueryRequest::new(CHANNEL, EXAMPLE_CC, "query")
                .with_args(["b"])
                .with_targets(targets.iter().copied()),
            &h.ctx(),
        )
        .await
        .unwrap();
    String::from_utf8(answers.first().unwrap().clone()).unwrap()
}

// =============================================================================
// FULL LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_lifecycle_from_empty_network() {
    let h = Harness::new();
    let org1_admin = h.admin(ORG1);
    let org2_admin = h.admin(ORG2);
    let ctx = h.ctx();

    let created = h
        .client
        .create_channel(
            org1_admin.as_ref(),
            CreateChannelRequest {
                channel: CHANNEL.into(),
                profile: "TwoOrgsChannel".into(),
                organizations: vec![ORG1.into(), ORG2.into()],
                ..CreateChannelRequest::default()
            },
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(created.orderer, ORDERER);
    assert_eq!(h.network.ledger_height(CHANNEL), Some(1));

    let joined = h
        .client
        .join_channel(org1_admin.as_ref(), join(&[PEER0_ORG1, PEER1_ORG1]), &ctx)
        .await
        .unwrap();
    assert_eq!(joined.joined.len(), 2);
    h.client
        .join_channel(org2_admin.as_ref(), join(&[PEER0_ORG2, PEER1_ORG2]), &ctx)
        .await
        .unwrap();
    assert_eq!(h.network.joined_channels(PEER1_ORG2), vec![CHANNEL.to_string()]);

    let installed = h
        .client
        .install_chaincode(org1_admin.as_ref(), install("1.0", &[PEER0_ORG1, PEER1_ORG1]), &ctx)
        .await
        .unwrap();
    assert_eq!(installed.installed_on.len(), 2);

    let mut deploy = DeployRequest::new(CHANNEL, ChaincodeSpec::new(EXAMPLE_CC, "1.0"))
        .with_args(["a", "200", "b", "300"]);
    deploy.targets = vec![PEER0_ORG1.into()];
    let deployed = h
        .client
        .instantiate_chaincode(org1_admin.as_ref(), deploy, &ctx)
        .await
        .unwrap();
    assert_eq!(deployed.receipt.validation_code, ValidationCode::Valid);
    assert!(matches!(
        deployed.readiness,
        Some(ReadinessOutcome::Ready { ref version, .. }) if version == "1.0"
    ));

    let receipt = h
        .client
        .invoke_chaincode(
            org1_admin.as_ref(),
            InvokeRequest::new(CHANNEL, EXAMPLE_CC, "invoke")
                .with_args(["a", "b", "100"])
                .with_targets([PEER0_ORG1]),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(receipt.validation_code, ValidationCode::Valid);
    assert_eq!(receipt.broadcast_attempts, 1);
    assert_eq!(query_b(&h, org1_admin.as_ref(), &[PEER0_ORG1, PEER1_ORG1]).await, "400");

    h.client
        .install_chaincode(org1_admin.as_ref(), install("1.1", &[PEER0_ORG1, PEER1_ORG1]), &ctx)
        .await
        .unwrap();
    let mut upgrade = DeployRequest::new(CHANNEL, ChaincodeSpec::new(EXAMPLE_CC, "1.1"))
        .with_args(["a", "10", "b", "20"]);
    upgrade.targets = vec![PEER0_ORG1.into()];
    let upgraded = h
        .client
        .upgrade_chaincode(org1_admin.as_ref(), upgrade, &ctx)
        .await
        .unwrap();
    assert!(matches!(
        upgraded.readiness,
        Some(ReadinessOutcome::Ready { ref version, .. }) if version == "1.1"
    ));
    assert_eq!(h.balance("b").as_deref(), Some("20"));

    let peers = [PEER0_ORG1.to_string()];
    let installed = h
        .client
        .query_installed_chaincodes(org1_admin.as_ref(), &peers, &ctx)
        .await
        .unwrap();
    let versions: Vec<_> = installed
        .for_peer(PEER0_ORG1)
        .unwrap()
        .chaincodes
        .iter()
        .map(|c| c.version.as_str())
        .collect();
    assert_eq!(versions, ["1.0", "1.1"]);

    // genesis + instantiate + invoke + upgrade
    let info = h
        .client
        .query_channel_info(org1_admin.as_ref(), CHANNEL, &peers, &ctx)
        .await
        .unwrap();
    assert_eq!(info.first().unwrap().height, 4);

    let config = h
        .client
        .get_channel_config(org1_admin.as_ref(), CHANNEL, &peers, &ctx)
        .await
        .unwrap();
    assert_eq!(config.organizations, [ORG1, ORG2]);
    assert_eq!(config.orderers, [ORDERER]);
}

// =============================================================================
// ENDORSEMENT OUTCOMES
// =============================================================================

#[tokio::test]
async fn test_install_all_targets_names_failing_peer() {
    let h = Harness::new();
    h.network
        .faults()
        .script(PEER1_ORG1, network_sim::Fault::reject(500, "disk full"));

    let err = h
        .client
        .install_chaincode(h.admin(ORG1).as_ref(), install("1.0", &[PEER0_ORG1, PEER1_ORG1]), &h.ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
    let failed: Vec<_> = err.failed_peers().iter().map(|f| f.peer.as_str()).collect();
    assert_eq!(failed, [PEER1_ORG1]);
    assert!(err.to_string().contains(PEER1_ORG1));
    assert!(h.network.broadcast_log().is_empty());
}

#[tokio::test]
async fn test_duplicate_install_is_endorsement_failure() {
    let h = Harness::new();
    let admin = h.admin(ORG1);
    h.client
        .install_chaincode(admin.as_ref(), install("1.0", &[PEER0_ORG1]), &h.ctx())
        .await
        .unwrap();

    let err = h
        .client
        .install_chaincode(admin.as_ref(), install("1.0", &[PEER0_ORG1]), &h.ctx())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_any_k_policy_ignores_hung_peer() {
    let h = Harness::deployed();
    h.network
        .faults()
        .set_sticky(PEER1_ORG1, network_sim::Fault::Hang);

    let mut request = InvokeRequest::new(CHANNEL, EXAMPLE_CC, "invoke")
        .with_args(["a", "b", "10"])
        .with_targets([PEER0_ORG1, PEER1_ORG1, PEER0_ORG2]);
    request.policy = Some(EndorsementPolicy::any_peers(2));
    let receipt = h
        .client
        .invoke_chaincode(h.user(ORG1).as_ref(), request, &h.ctx())
        .await
        .unwrap();

    assert_eq!(receipt.endorsers.len(), 2);
    assert!(!receipt.endorsers.iter().any(|p| p == PEER1_ORG1));
    assert_eq!(h.balance("b").as_deref(), Some("310"));
}

#[tokio::test]
async fn test_diverging_peer_is_result_mismatch() {
    let h = Harness::deployed();
    h.network
        .faults()
        .script(PEER1_ORG1, network_sim::Fault::Diverge);

    let err = h
        .client
        .invoke_chaincode(
            h.user(ORG1).as_ref(),
            InvokeRequest {
                policy: Some(EndorsementPolicy::AllTargets),
                ..InvokeRequest::new(CHANNEL, EXAMPLE_CC, "invoke")
                    .with_args(["a", "b", "10"])
                    .with_targets([PEER0_ORG1, PEER1_ORG1])
            },
            &h.ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResultMismatch);
    assert!(h.network.broadcast_log().is_empty());
    assert_eq!(h.balance("b").as_deref(), Some("300"));
}

#[tokio::test]
async fn test_impersonated_org_does_not_satisfy_policy() {
    let h = Harness::deployed();
    h.network
        .faults()
        .script(PEER0_ORG2, network_sim::Fault::reject(500, "busy"));
    h.network
        .faults()
        .script(PEER0_ORG1, network_sim::Fault::impersonate(PEER0_ORG2, ORG2));

    let err = h
        .client
        .invoke_chaincode(
            h.user(ORG1).as_ref(),
            InvokeRequest {
                policy: Some(EndorsementPolicy::signed_by(ORG2)),
                ..InvokeRequest::new(CHANNEL, EXAMPLE_CC, "invoke")
                    .with_args(["a", "b", "10"])
                    .with_targets([PEER0_ORG1, PEER0_ORG2])
            },
            &h.ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
    assert!(err.accepted_peers().is_empty());
    let failed: Vec<_> = err.failed_peers().iter().map(|f| f.peer.as_str()).collect();
    assert!(failed.contains(&PEER0_ORG1));
    assert!(h.network.broadcast_log().is_empty());
    assert_eq!(h.balance("b").as_deref(), Some("300"));
}

// =============================================================================
// READS
// =============================================================================

#[tokio::test]
async fn test_query_never_broadcasts() {
    let h = Harness::deployed();
    let height = h.network.ledger_height(CHANNEL);

    let value = query_b(&h, h.user(ORG2).as_ref(), &[PEER0_ORG1, PEER0_ORG2]).await;

    assert_eq!(value, "300");
    assert!(h.network.broadcast_log().is_empty());
    assert_eq!(h.network.ledger_height(CHANNEL), height);
}

#[tokio::test]
async fn test_query_of_missing_key_fails() {
    let h = Harness::deployed();
    let err = h
        .client
        .query_chaincode(
            h.user(ORG1).as_ref(),
            QueryRequest::new(CHANNEL, EXAMPLE_CC, "query")
                .with_args(["c"])
                .with_targets([PEER0_ORG1]),
            &h.ctx(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
    assert!(err.to_string().contains("Nil amount for c"));
}

#[tokio::test]
async fn test_rejoin_is_refused_by_peer() {
    let h = Harness::deployed();
    let err = h
        .client
        .join_channel(h.admin(ORG2).as_ref(), join(&[PEER0_ORG2]), &h.ctx())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
    assert!(err.to_string().contains(PEER0_ORG2));
}

#[tokio::test]
async fn test_partial_join_keeps_joined_peer() {
    let h = Harness::new();
    let admin = h.admin(ORG1);
    h.client
        .create_channel(
            admin.as_ref(),
            CreateChannelRequest {
                channel: CHANNEL.into(),
                profile: "TwoOrgsChannel".into(),
                organizations: vec![ORG1.into(), ORG2.into()],
                ..CreateChannelRequest::default()
            },
            &h.ctx(),
        )
        .await
        .unwrap();
    h.network
        .faults()
        .script(PEER1_ORG1, network_sim::Fault::reject(500, "ledger busy"));

    let err = h
        .client
        .join_channel(admin.as_ref(), join(&[PEER0_ORG1, PEER1_ORG1]), &h.ctx())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndorsementFailure);
    assert_eq!(err.accepted_peers(), &[PEER0_ORG1.to_string()]);
    let channel = h.client.get_channel(CHANNEL).unwrap();
    assert!(channel.contains_peer(PEER0_ORG1));
    assert!(!channel.contains_peer(PEER1_ORG1));

    let retried = h
        .client
        .join_channel(admin.as_ref(), join(&[PEER1_ORG1]), &h.ctx())
        .await
        .unwrap();
    assert_eq!(retried.joined, vec![PEER1_ORG1]);
    assert!(h.client.get_channel(CHANNEL).unwrap().contains_peer(PEER1_ORG1));
}

#[tokio::test]
async fn test_get_channel_after_new_channel() {
    let h = Harness::new();
    assert!(h.client.get_channel("mychannel").is_none());
    let declared = h.client.new_channel("mychannel", None);
    assert_eq!(declared.name(), "mychannel");
    assert_eq!(h.client.get_channel("mychannel"), Some(declared));
}
