//! # Channel Client Benchmarks
//!
//! | Stage | Measured |
//! |-------|----------|
//! | fc-01 Proposal | build + sign one proposal |
//! | fc-02 Endorsement | policy evaluation over growing target sets |
//! | fc-05 Orchestrator | query and invoke round-trips on the simulated network |

use client_runtime::{build_client, NetworkProfile};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fc_01_proposal::{ProposalBuilder, ProposalBuilderApi};
use fc_02_endorsement::PolicyEvaluator;
use fc_05_channel_orchestrator::{ChannelApi, InvokeRequest, QueryRequest};
use network_sim::{SimConfig, SimNetwork};
use shared_crypto::LocalSigningIdentity;
use shared_types::{EndorsementPolicy, IdentityProvider, Invocation, PeerEndpoint, ProposalKind, Role};
use std::time::Duration;

fn bench_proposal_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("fc-01-proposal");
    let builder = ProposalBuilder::new();
    let admin = LocalSigningIdentity::generate("org1.example.com", "Org1MSP", "Admin", Role::Admin);

    for arg_len in [16usize, 1024, 64 * 1024] {
        let payload = vec![0x5a; arg_len];
        group.throughput(Throughput::Bytes(arg_len as u64));
        group.bench_with_input(BenchmarkId::new("build_invoke", arg_len), &payload, |b, payload| {
            b.iter(|| {
                let invocation = Invocation::new("example_cc", "invoke").with_args([payload.as_slice()]);
                black_box(
                    builder
                        .build_proposal(&admin, "businesschannel", ProposalKind::Invoke, invocation)
                        .is_ok(),
                )
            })
        });
    }
    group.finish();
}

fn bench_policy_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fc-02-policy");

    for peers in [4usize, 32, 256] {
        let targets: Vec<PeerEndpoint> = (0..peers)
            .map(|i| PeerEndpoint::new(format!("peer{i}"), format!("org{}", i % 4), "grpc://localhost"))
            .collect();
        let endorsers: Vec<(&str, &str)> = targets
            .iter()
            .map(|p| (p.name.as_str(), p.org.as_str()))
            .collect();
        let policy = EndorsementPolicy::OutOf {
            n: 2,
            rules: (0..4).map(|o| EndorsementPolicy::signed_by(format!("org{o}"))).collect(),
        };
        let evaluator = PolicyEvaluator::new(&policy, &targets);

        group.throughput(Throughput::Elements(peers as u64));
        group.bench_with_input(BenchmarkId::new("out_of_signed_by", peers), &endorsers, |b, e| {
            b.iter(|| black_box(evaluator.is_satisfied(e)))
        });
        group.bench_with_input(BenchmarkId::new("all_targets", peers), &endorsers, |b, e| {
            let all = EndorsementPolicy::AllTargets;
            let evaluator = PolicyEvaluator::new(&all, &targets);
            b.iter(|| black_box(evaluator.is_satisfied(e)))
        });
    }
    group.finish();
}

fn bench_round_trips(c: &mut Criterion) {
    let mut group = c.benchmark_group("fc-05-orchestrator");
    group.measurement_time(Duration::from_secs(10));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let profile = NetworkProfile::sample();
    let registry = profile.registry().unwrap();
    let network = SimNetwork::from_registry(
        &registry,
        SimConfig {
            block_delay: Duration::ZERO,
            ready_delay: Duration::ZERO,
        },
    );
    network
        .bootstrap_channel(
            "businesschannel",
            &["org1.example.com", "org2.example.com"],
            &["peer0.org1.example.com", "peer0.org2.example.com"],
        )
        .unwrap();
    network
        .preload_chaincode("businesschannel", "kv", "1.0", &["hello", "world"])
        .unwrap();
    let client = build_client(profile.client.clone(), registry, &network);
    let user = profile
        .identities()
        .unwrap()
        .get_user("org1.example.com", "User1")
        .unwrap();
    let ctx = client.context();

    group.bench_function("query_two_peers", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let request = QueryRequest::new("businesschannel", "kv", "get")
                    .with_args(["hello"])
                    .with_targets(["peer0.org1.example.com", "peer0.org2.example.com"]);
                black_box(client.query_chaincode(user.as_ref(), request, &ctx).await.is_ok())
            })
        })
    });

    let mut counter = 0u64;
    group.bench_function("invoke_commit", |b| {
        b.iter(|| {
            counter += 1;
            let key = format!("k{counter}");
            runtime.block_on(async {
                let request = InvokeRequest::new("businesschannel", "kv", "put")
                    .with_args([key.as_str(), "v"])
                    .with_targets(["peer0.org1.example.com"]);
                black_box(client.invoke_chaincode(user.as_ref(), request, &ctx).await.is_ok())
            })
        })
    });
    group.finish();
}

criterion_group!(benches, bench_proposal_build, bench_policy_evaluation, bench_round_trips);
criterion_main!(benches);
