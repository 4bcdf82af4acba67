//! # Fabric Channel Client
//!
//! Runs a sample scenario against an in-process network. See the library
//! docs for the startup sequence and [`RuntimeSettings`] for configuration.

use anyhow::{Context, Result};
use client_runtime::{
    build_client, prepare_network, NetworkProfile, RuntimeSettings, ScenarioRunner,
};
use fc_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};
use network_sim::{SimConfig, SimNetwork};
use tracing::{debug, info, warn};

fn load_profile(settings: &RuntimeSettings) -> Result<NetworkProfile> {
    let mut profile = match &settings.profile_path {
        Some(path) => NetworkProfile::load(path)
            .with_context(|| format!("loading profile {}", path.display()))?,
        None => {
            info!("FC_NETWORK_PROFILE not set, using the built-in sample network");
            NetworkProfile::sample()
        }
    };
    if let Some(commit) = settings.commit_timeout {
        profile.client.timeouts.commit_ms = commit.as_millis() as u64;
    }
    profile.client.validate().context("invalid client configuration")?;
    Ok(profile)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let settings = RuntimeSettings::from_env()?;
    let profile = load_profile(&settings)?;
    let registry = profile.registry()?;
    let identities = profile.identities()?;
    info!(
        network = %profile.name,
        scenario = ?settings.scenario,
        peers = registry.peers().count(),
        "Starting channel client"
    );

    let mut sim_config = SimConfig::default();
    if let Some(delay) = settings.block_delay {
        sim_config.block_delay = delay;
    }
    let network = SimNetwork::from_registry(&registry, sim_config);
    prepare_network(&network, &profile, settings.scenario)?;

    let client = build_client(profile.client.clone(), registry, &network);
    let report = ScenarioRunner::new(&client, &identities, client.context())
        .run(settings.scenario)
        .await?;

    for (i, step) in report.steps.iter().enumerate() {
        info!(n = i + 1, step = step.step, "{}", step.summary);
    }
    info!(
        proposals = client.proposals_built(),
        blocks = network.blocks_cut(),
        "Scenario finished"
    );

    match gather_metrics() {
        Ok(text) => debug!(metrics = %text, "Metrics snapshot"),
        Err(e) => warn!(error = %e, "Could not gather metrics"),
    }
    Ok(())
}
