//! # Ports Layer
//!
//! - **Inbound (Driving)**: `EndorsementApi`
//! - **Outbound (Driven)**: `PeerGateway`, `EndorsementVerifier`

pub mod inbound;
pub mod outbound;
