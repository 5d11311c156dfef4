//! Runs a fixed pool of workers against one target and folds their results.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::args::{CredentialPlacement, HttpMethod, PositiveU64, PositiveUsize};
use crate::error::{AppError, AppResult};
use crate::http::{ClientSettings, Transport, build_transport};

use super::cancel::{NeverStop, StopSignal, StopSource, spawn_stop_watcher};
use super::config::RunConfig;
use super::errors::ErrorSink;
use super::summary::{RunOutcome, RunSummary};
use super::worker::{Worker, WorkerTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
}

/// Orchestrates load runs over one shared transport. A runner can be reused
/// for any number of sequential runs but only executes one at a time.
pub struct LoadRunner {
    transport: Arc<dyn Transport>,
    state: Mutex<RunnerState>,
}

/// Puts the runner back to idle when a run ends, however it ends.
struct RunningGuard<'runner> {
    state: &'runner Mutex<RunnerState>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RunnerState::Idle;
    }
}

impl LoadRunner {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Mutex::new(RunnerState::Idle),
        }
    }

    /// Builds a runner over a pooled `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn from_settings(settings: &ClientSettings) -> AppResult<Self> {
        let transport = build_transport(settings).map_err(|err| {
            error!("{}", err);
            AppError::http(err)
        })?;
        Ok(Self::new(Arc::new(transport)))
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs to natural completion; nothing can stop it early.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RunnerBusy`] when another run is in progress.
    pub async fn run(&self, config: RunConfig) -> AppResult<RunSummary> {
        self.run_until(config, NeverStop).await
    }

    /// Runs until every worker finishes or `stop_source` requests a stop.
    /// A stop is not an error: the summary then carries partial counts.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RunnerBusy`] when another run is in progress.
    pub async fn run_until<S>(&self, config: RunConfig, stop_source: S) -> AppResult<RunSummary>
    where
        S: StopSource,
    {
        let _running = self.begin()?;

        let concurrency = config.concurrency.get();
        let planned = config.planned_requests();
        info!(
            "Starting {} {}: {} workers x {} requests, delay {:?}",
            config.method,
            config.url,
            concurrency,
            config.requests_per_worker.get(),
            config.delay
        );

        let config = Arc::new(config);
        let stop = StopSignal::new();
        let errors = Arc::new(ErrorSink::new());
        let workers_done = Arc::new(AtomicBool::new(false));

        let started = Instant::now();
        // The watcher is never joined; it exits on its own once the signal
        // trips or the workers are done.
        drop(spawn_stop_watcher(
            stop_source,
            stop.clone(),
            Arc::clone(&workers_done),
        ));

        let handles = (1..=concurrency).map(|id| {
            let worker = Worker::new(
                id,
                Arc::clone(&config),
                Arc::clone(&self.transport),
                Arc::clone(&errors),
                stop.clone(),
            );
            tokio::spawn(worker.run())
        });
        let results = join_all(handles).await;
        workers_done.store(true, Ordering::Release);
        let elapsed = started.elapsed();

        let mut tally = WorkerTally::default();
        for result in results {
            match result {
                Ok(worker_tally) => tally = tally.merge(worker_tally),
                Err(err) => error!("Worker task failed: {}", err),
            }
        }

        let outcome = if stop.is_tripped() && tally.attempted() < planned {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };
        let summary = RunSummary::compute(elapsed, tally, errors.snapshot(), outcome);
        match outcome {
            RunOutcome::Completed => info!(
                "Run completed: {} ok, {} failed in {:?}",
                summary.success, summary.failure, summary.elapsed
            ),
            RunOutcome::Cancelled => warn!(
                "Run cancelled after {} of {} requests",
                summary.total, planned
            ),
        }
        Ok(summary)
    }

    fn begin(&self) -> AppResult<RunningGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RunnerState::Running {
            return Err(AppError::RunnerBusy);
        }
        *state = RunnerState::Running;
        Ok(RunningGuard { state: &self.state })
    }
}

/// One-shot run over a default `reqwest` transport, without a stop source.
///
/// # Errors
///
/// Returns an error only when the HTTP client cannot be constructed.
pub async fn run_load(
    url: &str,
    credential: Option<&str>,
    method: HttpMethod,
    concurrency: PositiveUsize,
    requests_per_worker: PositiveU64,
    delay: Duration,
    body: Option<&str>,
) -> AppResult<RunSummary> {
    let runner = LoadRunner::from_settings(&ClientSettings::default())?;
    let config = RunConfig::new(url, method)
        .with_load(concurrency, requests_per_worker)
        .with_delay(delay)
        .with_credential(credential.map(str::to_owned), CredentialPlacement::default())
        .with_body(body.map(str::to_owned));
    runner.run(config).await
}
