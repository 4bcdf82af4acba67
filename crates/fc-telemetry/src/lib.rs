//! # Channel Client Telemetry
//!
//! Structured logging and Prometheus metrics for the channel client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FC_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `FC_JSON_LOGS` | `false` | Emit JSON lines instead of human output |
//! | `FC_SERVICE_NAME` | `fabric-channel-client` | Service name in log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, register_metrics, OperationTimer, BROADCAST_ATTEMPTS, COMMIT_OUTCOMES,
    ENDORSEMENT_RESPONSES, OPERATION_DURATION, OPERATION_ERRORS, PROPOSALS_BUILT,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Keeps telemetry active for the lifetime of the process.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Register metrics, then install the global subscriber.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}
