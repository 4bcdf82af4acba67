//! # Ports Layer
//!
//! - **Inbound (Driving)**: API the orchestrator calls

pub mod inbound;
