//! # Ports Layer
//!
//! - **Inbound (Driving)**: `CommitMonitorApi`
//! - **Outbound (Driven)**: `LedgerEventSource`

pub mod inbound;
pub mod outbound;
