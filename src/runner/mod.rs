//! Load run orchestration: workers, cooperative cancellation, error
//! collection and the final summary.
mod cancel;
mod config;
mod errors;
mod load;
mod summary;
mod worker;

#[cfg(test)]
mod test_support;

pub use cancel::{
    AnyStop, ManualStop, NeverStop, StopAfter, StopSignal, StopSource, WATCH_POLL_INTERVAL,
    spawn_stop_watcher,
};
pub use config::RunConfig;
pub use errors::{ERROR_SAMPLE_LIMIT, ErrorSink, ErrorSnapshot, error_record};
pub use load::{LoadRunner, RunnerState, run_load};
pub use summary::{RunOutcome, RunSummary};
pub use worker::{Worker, WorkerTally};
