//! # Ports Layer
//!
//! The orchestrator has no driven ports of its own; it drives the
//! [`EndorsementApi`](fc_02_endorsement::EndorsementApi),
//! [`SubmissionApi`](fc_03_submission::SubmissionApi) and
//! [`CommitMonitorApi`](fc_04_commit_monitor::CommitMonitorApi) ports.

pub mod inbound;
