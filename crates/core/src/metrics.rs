//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (outcomes, durations, engine slot waits)
//! - Engine interaction (submissions, status polls)
//! - Artifact transfers
//! - Startup (readiness probes, model sync)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Finished jobs by terminal status.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("graphrelay_jobs_total", "Total finished jobs"),
        &["status"], // "completed", "failed", "timed_out"
    )
    .unwrap()
});

/// End-to-end job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("graphrelay_job_duration_seconds", "End-to-end job duration")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["status"],
    )
    .unwrap()
});

/// Time spent waiting for the engine slot, in seconds.
pub static ENGINE_SLOT_WAIT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "graphrelay_engine_slot_wait_seconds",
            "Time a job waited for exclusive access to the engine",
        )
        .buckets(vec![0.01, 0.1, 1.0, 5.0, 30.0, 120.0, 600.0]),
    )
    .unwrap()
});

/// Jobs currently admitted (resolving, running or publishing).
pub static JOBS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("graphrelay_jobs_in_flight", "Jobs currently admitted").unwrap()
});

// =============================================================================
// Engine
// =============================================================================

/// Graph submissions by result.
pub static ENGINE_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("graphrelay_engine_submissions_total", "Graph submissions"),
        &["result"], // "accepted", "rejected", "unavailable"
    )
    .unwrap()
});

/// Status polls issued to the engine.
pub static ENGINE_POLLS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("graphrelay_engine_polls_total", "Engine status polls").unwrap()
});

// =============================================================================
// Artifacts
// =============================================================================

/// Artifact transfers by direction and result.
pub static ARTIFACT_TRANSFERS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("graphrelay_artifact_transfers_total", "Artifact transfers"),
        &["direction", "result"], // direction: "download", "upload"
    )
    .unwrap()
});

// =============================================================================
// Startup
// =============================================================================

/// Readiness probe attempts by result.
pub static READINESS_PROBES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("graphrelay_readiness_probes_total", "Engine readiness probes"),
        &["result"],
    )
    .unwrap()
});

/// Model sync runs by outcome.
pub static MODEL_SYNC_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("graphrelay_model_sync_runs_total", "Model sync runs"),
        &["outcome"], // "skipped", "synced", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ENGINE_SLOT_WAIT.clone()),
        Box::new(JOBS_IN_FLIGHT.clone()),
        // Engine
        Box::new(ENGINE_SUBMISSIONS.clone()),
        Box::new(ENGINE_POLLS.clone()),
        // Artifacts
        Box::new(ARTIFACT_TRANSFERS.clone()),
        // Startup
        Box::new(READINESS_PROBES.clone()),
        Box::new(MODEL_SYNC_RUNS.clone()),
    ]
}
