//! Prometheus metrics for the channel client.
//!
//! All metrics follow the naming convention: `fc_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::time::Instant;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Signed proposals handed to the endorsement fan-out
    pub static ref PROPOSALS_BUILT: CounterVec = CounterVec::new(
        Opts::new("fc_proposals_built_total", "Signed proposals built"),
        &["kind"]
    ).expect("metric creation failed");

    /// Peer answers by outcome: accepted/rejected/unreachable/unanswered
    pub static ref ENDORSEMENT_RESPONSES: CounterVec = CounterVec::new(
        Opts::new("fc_endorsement_responses_total", "Endorsement responses by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Orderer broadcast attempts by outcome: accepted/unreachable/rejected
    pub static ref BROADCAST_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("fc_broadcast_attempts_total", "Orderer broadcast attempts by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Final commit status of submitted transactions
    pub static ref COMMIT_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("fc_commit_outcomes_total", "Commit outcomes by status"),
        &["status"]
    ).expect("metric creation failed");

    /// Wall time of facade operations
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "fc_operation_duration_seconds",
            "Time spent in one facade operation"
        ).buckets(exponential_buckets(0.001, 2.0, 16).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");

    /// Failed facade operations by error kind
    pub static ref OPERATION_ERRORS: CounterVec = CounterVec::new(
        Opts::new("fc_operation_errors_total", "Failed operations by error kind"),
        &["operation", "kind"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(PROPOSALS_BUILT.clone()),
        Box::new(ENDORSEMENT_RESPONSES.clone()),
        Box::new(BROADCAST_ATTEMPTS.clone()),
        Box::new(COMMIT_OUTCOMES.clone()),
        Box::new(OPERATION_DURATION.clone()),
        Box::new(OPERATION_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Observes [`OPERATION_DURATION`] for one operation on drop.
#[derive(Debug)]
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        OPERATION_DURATION
            .with_label_values(&[self.operation])
            .observe(self.start.elapsed().as_secs_f64());
    }
}
