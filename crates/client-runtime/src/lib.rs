//! # Channel Client Runtime
//!
//! Everything the `fabric-client` binary needs besides `main`:
//!
//! - `profile/` - JSON network profile, turned into the endpoint registry
//!   and the identity store
//! - `settings/` - environment overrides
//! - `wiring/` - the orchestrator assembled over the simulated network
//! - `scenario/` - the sample walkthroughs
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry
//! 2. Load settings and the network profile
//! 3. Build the simulated network from the profile's endpoints
//! 4. Wire the channel client and run the selected scenario
//! 5. Log the step report and the metrics snapshot

pub mod profile;
pub mod scenario;
pub mod settings;
pub mod wiring;

pub use profile::{NetworkProfile, ProfileError};
pub use scenario::{prepare_network, ScenarioReport, ScenarioRunner, StepRecord};
pub use settings::{RuntimeSettings, Scenario, SettingsError};
pub use wiring::{build_client, SimChannelClient};
