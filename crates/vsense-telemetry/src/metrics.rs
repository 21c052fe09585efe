//! Prometheus metrics for VolatiSense.
//!
//! Covers:
//! - Stats lookups by outcome
//! - Placeholder record synthesis
//! - Batch generation results
//! - Pipeline runs and stage durations
//! - Active sessions
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a fatal configuration error that should
//! crash at startup. These panics only occur during static initialization.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_gauge,
    CounterVec, Encoder, HistogramVec, IntCounter, IntGauge, TextEncoder,
};

/// Stats lookups.
/// Labels: outcome (hit/synthesized/not_found/error)
pub static STATS_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vsense_stats_requests_total",
        "Total stats lookups by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Placeholder records written.
pub static SYNTHESIZED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "vsense_synthesized_records_total",
        "Total placeholder records synthesized and stored"
    )
    .unwrap()
});

/// Per-ticker results of batch generation.
/// Labels: status (created/exists/failed)
pub static BATCH_RESULTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vsense_batch_results_total",
        "Per-ticker results of batch stats generation",
        &["status"]
    )
    .unwrap()
});

/// Pipeline runs.
/// Labels: outcome (succeeded/fetch_failed/train_failed/rejected)
pub static PIPELINE_RUNS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vsense_pipeline_runs_total",
        "Total pipeline runs by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Pipeline stage duration in seconds.
pub static PIPELINE_STAGE_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "vsense_pipeline_stage_seconds",
        "Pipeline stage wall-clock duration in seconds",
        &["stage", "outcome"],
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0]
    )
    .unwrap()
});

/// Currently valid sessions.
pub static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("vsense_active_sessions", "Currently valid sessions").unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a stats lookup outcome.
    pub fn stats_request(outcome: &str) {
        STATS_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a synthesized record.
    pub fn record_synthesized() {
        SYNTHESIZED_TOTAL.inc();
    }

    /// Record one ticker's batch result.
    pub fn batch_result(status: &str) {
        BATCH_RESULTS_TOTAL.with_label_values(&[status]).inc();
    }

    /// Record a finished pipeline run.
    pub fn pipeline_run(outcome: &str) {
        PIPELINE_RUNS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a finished pipeline stage.
    pub fn pipeline_stage(stage: &str, outcome: &str, seconds: f64) {
        PIPELINE_STAGE_SECONDS
            .with_label_values(&[stage, outcome])
            .observe(seconds);
    }

    /// Update active session count.
    pub fn active_sessions(count: usize) {
        ACTIVE_SESSIONS.set(count as i64);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
