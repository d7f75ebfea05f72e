//! Conversion metrics.
//!
//! Counters are atomics; duration samples sit behind a mutex and are kept
//! to a bounded window for percentile calculation.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::models::{FailureReason, OutputKind};

/// Maximum number of duration samples kept in memory.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Conversion metrics collector, shared by all requests.
#[derive(Debug)]
pub struct ConversionMetrics {
    /// Conversions started.
    pub conversions_started: AtomicU64,
    /// Conversions that produced both outputs.
    pub conversions_succeeded: AtomicU64,
    /// Conversions that ended in any failure.
    pub conversions_failed: AtomicU64,
    /// Calls dropped before reaching an outcome.
    pub conversions_cancelled: AtomicU64,
    /// Failures because the executable was missing.
    pub executable_missing: AtomicU64,
    /// Failures of the mesh invocation.
    pub mesh_step_failures: AtomicU64,
    /// Failures of the metadata invocation.
    pub metadata_step_failures: AtomicU64,
    /// Converter processes spawned.
    pub process_invocations: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

impl ConversionMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            conversions_started: AtomicU64::new(0),
            conversions_succeeded: AtomicU64::new(0),
            conversions_failed: AtomicU64::new(0),
            conversions_cancelled: AtomicU64::new(0),
            executable_missing: AtomicU64::new(0),
            mesh_step_failures: AtomicU64::new(0),
            metadata_step_failures: AtomicU64::new(0),
            process_invocations: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    /// Record a conversion start.
    pub fn record_started(&self) {
        self.conversions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one converter process launch.
    pub fn record_invocation(&self) {
        self.process_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful conversion and its duration.
    pub fn record_success(&self, duration: Duration) {
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a call abandoned by its caller mid-flight.
    pub fn record_cancelled(&self) {
        self.conversions_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed conversion, classified by reason.
    pub fn record_failure(&self, reason: &FailureReason) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
        match reason {
            FailureReason::ExecutableNotFound { .. } => {
                self.executable_missing.fetch_add(1, Ordering::Relaxed);
            }
            FailureReason::ProcessExitedNonZero(detail) => match detail.stage {
                OutputKind::Mesh => {
                    self.mesh_step_failures.fetch_add(1, Ordering::Relaxed);
                }
                OutputKind::Metadata => {
                    self.metadata_step_failures.fetch_add(1, Ordering::Relaxed);
                }
            },
            FailureReason::DirectoryCreation { .. }
            | FailureReason::InputNotFound { .. }
            | FailureReason::InputUnreadable { .. }
            | FailureReason::LaunchFailed { .. } => {}
        }
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    /// Point-in-time snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();

        let (p50, p95) = Self::calculate_percentiles(&durations);

        MetricsSnapshot {
            conversions_started: self.conversions_started.load(Ordering::Relaxed),
            conversions_succeeded: self.conversions_succeeded.load(Ordering::Relaxed),
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            conversions_cancelled: self.conversions_cancelled.load(Ordering::Relaxed),
            executable_missing: self.executable_missing.load(Ordering::Relaxed),
            mesh_step_failures: self.mesh_step_failures.load(Ordering::Relaxed),
            metadata_step_failures: self.metadata_step_failures.load(Ordering::Relaxed),
            process_invocations: self.process_invocations.load(Ordering::Relaxed),
            duration_p50_ms: p50.map(|d| d.as_millis() as u64),
            duration_p95_ms: p95.map(|d| d.as_millis() as u64),
            sample_count: durations.len() as u64,
        }
    }

    fn calculate_percentiles(durations: &[Duration]) -> (Option<Duration>, Option<Duration>) {
        if durations.is_empty() {
            return (None, None);
        }

        let mut sorted = durations.to_vec();
        sorted.sort();
        let len = sorted.len();

        (
            sorted.get(len * 50 / 100).copied(),
            sorted.get(len * 95 / 100).copied(),
        )
    }
}

impl Default for ConversionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ConversionMetrics`], served by `GET /metrics`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    /// Conversions started.
    pub conversions_started: u64,
    /// Conversions that produced both outputs.
    pub conversions_succeeded: u64,
    /// Conversions that failed.
    pub conversions_failed: u64,
    /// Conversions abandoned before an outcome.
    pub conversions_cancelled: u64,
    /// Failures due to a missing executable.
    pub executable_missing: u64,
    /// Mesh step failures.
    pub mesh_step_failures: u64,
    /// Metadata step failures.
    pub metadata_step_failures: u64,
    /// Converter processes spawned.
    pub process_invocations: u64,
    /// Median successful conversion time.
    pub duration_p50_ms: Option<u64>,
    /// 95th percentile successful conversion time.
    pub duration_p95_ms: Option<u64>,
    /// Number of duration samples.
    pub sample_count: u64,
}
