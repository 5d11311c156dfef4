use std::time::Duration;

use serde::{Serialize, Serializer};

use super::errors::ErrorSnapshot;
use super::worker::WorkerTally;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every worker issued all of its requests.
    Completed,
    /// A stop request ended the run early.
    Cancelled,
}

/// Final statistics of a run. Computed once, after every worker has returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub success: u64,
    pub failure: u64,
    pub total: u64,
    pub requests_per_second: f64,
    /// Percentage in `0..=100`.
    pub success_rate: f64,
    pub sample_errors: Vec<String>,
    pub error_overflow_count: usize,
    pub outcome: RunOutcome,
}

impl RunSummary {
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "Throughput and success rate are reported as floating point values"
    )]
    pub fn compute(
        elapsed: Duration,
        tally: WorkerTally,
        errors: ErrorSnapshot,
        outcome: RunOutcome,
    ) -> Self {
        let total = tally.attempted();
        let elapsed_secs = elapsed.as_secs_f64();
        let requests_per_second = if elapsed_secs > 0.0 {
            total as f64 / elapsed_secs
        } else {
            0.0
        };
        let success_rate = if total > 0 {
            tally.success as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let error_overflow_count = errors.total.saturating_sub(errors.samples.len());

        Self {
            elapsed,
            success: tally.success,
            failure: tally.failure,
            total,
            requests_per_second,
            success_rate,
            sample_errors: errors.samples,
            error_overflow_count,
            outcome,
        }
    }

    #[must_use]
    pub const fn was_cancelled(&self) -> bool {
        matches!(self.outcome, RunOutcome::Cancelled)
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
