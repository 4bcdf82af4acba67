//! # Fault Tolerance
//!
//! Orderer outages, slow or silent peers, commit windows and caller
//! cancellation. Every call must end in exactly one outcome, and no outcome
//! other than a receipt may claim the transaction committed.

use super::harness::*;
use fc_05_channel_orchestrator::{ChannelApi, ClientError, ErrorKind, InvokeRequest};
use network_sim::{Fault, SimConfig};
use shared_types::{cancel_pair, EndorsementPolicy, ValidationCode};
use std::time::Duration;
use tokio::time::sleep;

fn move_a_to_b(amount: &str) -> InvokeRequest {
    InvokeRequest::new(CHANNEL, EXAMPLE_CC, "invoke")
        .with_args(["a", "b", amount])
        .with_targets([PEER0_ORG1])
}

// =============================================================================
// ORDERING
// =============================================================================

#[tokio::test]
async fn test_invoke_retries_unreachable_orderer_with_same_tx_id() {
    let h = Harness::deployed();
    h.network.faults().fail_next(ORDERER, 1);

    let receipt = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("100"), &h.ctx())
        .await
        .unwrap();

    assert_eq!(receipt.validation_code, ValidationCode::Valid);
    assert_eq!(receipt.broadcast_attempts, 2);
    let log = h.network.broadcast_log();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|r| r.tx_id == receipt.tx_id));
    assert!(!log[0].reached);
    assert!(log[1].reached);
    assert_eq!(h.balance("a").as_deref(), Some("100"));
    assert_eq!(h.balance("b").as_deref(), Some("400"));
}

#[tokio::test]
async fn test_orderer_down_is_ordering_unavailable() {
    let h = Harness::deployed();
    h.network.faults().take_down(ORDERER);

    let err = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("100"), &h.ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OrderingUnavailable);
    let max_attempts = h.profile.client.retry.max_attempts as usize;
    assert_eq!(h.network.broadcast_log().len(), max_attempts);
    assert_eq!(h.balance("b").as_deref(), Some("300"));
}

#[tokio::test]
async fn test_orderer_rejection_is_not_retried() {
    let h = Harness::deployed();
    h.network
        .faults()
        .script(ORDERER, Fault::reject(503, "consenter unavailable"));

    let err = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("100"), &h.ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SubmissionRejected);
    assert_eq!(h.network.broadcast_log().len(), 1);
}

// =============================================================================
// ENDORSEMENT
// =============================================================================

#[tokio::test]
async fn test_silent_peers_end_in_endorsement_timeout() {
    let h = Harness::with(SimConfig::default(), |c| c.timeouts.endorsement_ms = 100)
        .with_deployed_channel();
    h.network.faults().set_sticky(PEER0_ORG1, Fault::Hang);

    let err = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("100"), &h.ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EndorsementTimeout);
    assert!(h.network.broadcast_log().is_empty());
}

#[tokio::test]
async fn test_unreachable_peer_tolerated_by_any_one_policy() {
    let h = Harness::deployed();
    h.network.faults().take_down(PEER0_ORG1);

    let mut request = move_a_to_b("50").with_targets([PEER0_ORG1, PEER1_ORG1]);
    request.policy = Some(EndorsementPolicy::any_peers(1));
    let receipt = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), request, &h.ctx())
        .await
        .unwrap();

    assert_eq!(receipt.endorsers, [PEER1_ORG1]);
    assert_eq!(h.balance("b").as_deref(), Some("350"));
}

#[tokio::test]
async fn test_slow_peer_within_window_still_endorses() {
    let h = Harness::deployed();
    h.network
        .faults()
        .script(PEER0_ORG1, Fault::Delay(Duration::from_millis(50)));

    let receipt = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("1"), &h.ctx())
        .await
        .unwrap();
    assert_eq!(receipt.endorsers, [PEER0_ORG1]);
}

// =============================================================================
// COMMIT WINDOW
// =============================================================================

#[tokio::test]
async fn test_commit_timeout_then_late_commit() {
    let sim = SimConfig {
        block_delay: Duration::from_millis(400),
        ready_delay: Duration::from_millis(5),
    };
    let h = Harness::with(sim, |c| c.timeouts.commit_ms = 100).with_deployed_channel();

    let err = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("100"), &h.ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CommitTimeout);
    let ClientError::CommitTimeout { tx_id, .. } = &err else {
        panic!("expected commit timeout, got {err}");
    };
    assert_eq!(&h.network.broadcast_log()[0].tx_id, tx_id);

    // Unknown is not failure: the block is still cut.
    sleep(Duration::from_millis(600)).await;
    assert_eq!(h.balance("b").as_deref(), Some("400"));
}

#[tokio::test]
async fn test_no_event_source_means_nothing_broadcast() {
    let mut profile = client_runtime::NetworkProfile::sample();
    profile
        .peers
        .get_mut(PEER0_ORG1)
        .unwrap()
        .roles
        .event_source = false;
    let h = Harness::from_profile(profile, Harness::fast_sim()).with_deployed_channel();
    for peer in [PEER1_ORG1, PEER0_ORG2, PEER1_ORG2] {
        h.network.faults().take_down(peer);
    }

    let err = h
        .client
        .invoke_chaincode(h.admin(ORG1).as_ref(), move_a_to_b("5"), &h.ctx())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::EventSourceUnavailable { .. }));
    assert_eq!(err.kind(), ErrorKind::OrderingUnavailable);
    assert!(h.network.broadcast_log().is_empty());
    assert_eq!(h.balance("b").as_deref(), Some("300"));
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test]
async fn test_cancel_during_endorsement_stops_all_sends() {
    let h = Harness::deployed();
    h.network.faults().set_sticky(PEER0_ORG1, Fault::Hang);
    h.network.faults().set_sticky(PEER1_ORG1, Fault::Hang);

    let (handle, signal) = cancel_pair();
    let ctx = h.ctx().with_cancel(signal);
    let admin = h.admin(ORG1);
    let request = move_a_to_b("100").with_targets([PEER0_ORG1, PEER1_ORG1]);

    let (result, ()) = tokio::join!(
        h.client.invoke_chaincode(admin.as_ref(), request, &ctx),
        async {
            sleep(Duration::from_millis(50)).await;
            handle.cancel();
        }
    );

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
    let sent = h.network.proposals_received();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(h.network.proposals_received(), sent);
    assert!(h.network.broadcast_log().is_empty());
}

#[tokio::test]
async fn test_cancel_while_waiting_for_commit() {
    let sim = SimConfig {
        block_delay: Duration::from_millis(300),
        ready_delay: Duration::from_millis(5),
    };
    let h = Harness::with(sim, |_| {}).with_deployed_channel();

    let (handle, signal) = cancel_pair();
    let ctx = h.ctx().with_cancel(signal);
    let admin = h.admin(ORG1);

    let (result, ()) = tokio::join!(
        h.client.invoke_chaincode(admin.as_ref(), move_a_to_b("100"), &ctx),
        async {
            sleep(Duration::from_millis(100)).await;
            handle.cancel();
        }
    );

    assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
    assert_eq!(h.network.broadcast_log().len(), 1);
}

#[tokio::test]
async fn test_already_cancelled_call_sends_nothing() {
    let h = Harness::deployed();
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let err = h
        .client
        .invoke_chaincode(
            h.admin(ORG1).as_ref(),
            move_a_to_b("100"),
            &h.ctx().with_cancel(signal),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(h.network.proposals_received(), 0);
}
