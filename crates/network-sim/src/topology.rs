//! Ready-made network layouts.

use shared_types::{EndpointRegistry, OrdererEndpoint, Organization, PeerEndpoint};

pub const ORG1: &str = "org1.example.com";
pub const ORG2: &str = "org2.example.com";
pub const ORDERER: &str = "orderer.example.com";

/// Two organizations with two peers each and a single orderer. No channels
/// are declared.
pub fn two_org_registry() -> EndpointRegistry {
    let mut registry = EndpointRegistry::new();
    registry.add_organization(Organization::new(ORG1, "Org1MSP"));
    registry.add_organization(Organization::new(ORG2, "Org2MSP"));
    for (peer, org, port) in [
        ("peer0.org1.example.com", ORG1, 7051),
        ("peer1.org1.example.com", ORG1, 7056),
        ("peer0.org2.example.com", ORG2, 8051),
        ("peer1.org2.example.com", ORG2, 8056),
    ] {
        registry.add_peer(PeerEndpoint::new(peer, org, format!("grpc://localhost:{port}")));
    }
    registry.add_orderer(OrdererEndpoint::new(ORDERER, "grpc://localhost:7050"));
    registry
}
