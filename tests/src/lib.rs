//! # Channel Client Test Suite
//!
//! End-to-end tests that drive the channel orchestrator against the
//! simulated network, plus throughput benchmarks.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── harness.rs          # Sample network + wired client fixture
//! │   ├── channel_flows.rs    # Lifecycle: create, join, install, deploy, invoke
//! │   ├── fault_tolerance.rs  # Peer/orderer faults, timeouts, cancellation
//! │   └── concurrency.rs      # Parallel calls on one client
//! └── benches/
//!     └── client_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p fc-tests
//!
//! # By category
//! cargo test -p fc-tests integration::fault_tolerance::
//!
//! # Benchmarks
//! cargo bench -p fc-tests
//! ```

#![allow(clippy::unwrap_used)]

pub mod integration;
