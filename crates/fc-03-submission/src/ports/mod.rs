//! # Ports Layer
//!
//! - **Inbound (Driving)**: `SubmissionApi`
//! - **Outbound (Driven)**: `OrdererGateway`

pub mod inbound;
pub mod outbound;
