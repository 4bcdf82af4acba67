//! # Concurrency
//!
//! One client shared by many in-flight calls. Calls keep their own
//! proposal, responses and outcome; the ledger decides conflicts.

use super::harness::*;
use fc_05_channel_orchestrator::{ChannelApi, ErrorKind, InvokeRequest, QueryRequest};
use futures::future::join_all;
use shared_types::ValidationCode;
use std::collections::HashSet;

#[tokio::test]
async fn test_concurrent_queries_get_distinct_tx_ids() {
    let h = Harness::deployed();
    let user = h.user(ORG1);
    let ctx = h.ctx();

    let calls = (0..200).map(|i| {
        let target = if i % 2 == 0 { PEER0_ORG1 } else { PEER1_ORG2 };
        h.client.query_chaincode(
            user.as_ref(),
            QueryRequest::new(CHANNEL, EXAMPLE_CC, "query")
                .with_args(["a"])
                .with_targets([target]),
            &ctx,
        )
    });
    let results = join_all(calls).await;

    let mut ids = HashSet::new();
    for result in results {
        let answers = result.unwrap();
        assert_eq!(answers.first().unwrap().as_slice(), b"200");
        ids.insert(answers.tx_id);
    }
    assert_eq!(ids.len(), 200);
    assert!(h.network.broadcast_log().is_empty());
}

#[tokio::test]
async fn test_conflicting_invokes_conserve_balance() {
    let h = Harness::deployed();
    let admin = h.admin(ORG1);
    let ctx = h.ctx();

    let calls = (0..8).map(|_| {
        h.client.invoke_chaincode(
            admin.as_ref(),
            InvokeRequest::new(CHANNEL, EXAMPLE_CC, "invoke")
                .with_args(["a", "b", "10"])
                .with_targets([PEER0_ORG1]),
            &ctx,
        )
    });
    let results = join_all(calls).await;

    let mut committed = 0;
    for result in &results {
        match result {
            Ok(receipt) => {
                assert_eq!(receipt.validation_code, ValidationCode::Valid);
                committed += 1;
            }
            // A stale read set is invalidated at commit, never reported as success.
            Err(e) => assert_eq!(e.kind(), ErrorKind::SubmissionRejected, "{e}"),
        }
    }
    assert!(committed >= 1);

    let a: i64 = h.balance("a").unwrap().parse().unwrap();
    let b: i64 = h.balance("b").unwrap().parse().unwrap();
    assert_eq!(a + b, 500);
    assert_eq!(b, 300 + 10 * committed);
    assert_eq!(h.network.broadcast_log().len(), 8);
}
