//! Cooperative cancellation: a run-wide stop signal and the watcher that
//! trips it when an external stop request shows up.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How often the watcher asks its source whether a stop was requested.
pub const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Edge-triggered, run-wide stop flag. Trips at most once; every clone sees it.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trips the signal. Returns `true` only for the call that flipped it.
    pub fn trip(&self) -> bool {
        self.tx.send_if_modified(|tripped| {
            if *tripped {
                false
            } else {
                *tripped = true;
                true
            }
        })
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal is tripped, immediately if it already is.
    pub async fn tripped(&self) {
        let mut rx = self.tx.subscribe();
        let closed = rx.wait_for(|tripped| *tripped).await.is_err();
        if closed {
            // The sender lives in `self`, so the channel cannot close here.
            std::future::pending::<()>().await;
        }
    }
}

/// External source of "stop now" requests, polled by the watcher.
pub trait StopSource: Send + 'static {
    /// Returns `true` once a stop has been requested. Must not block for long.
    fn stop_requested(&mut self) -> bool;
}

impl StopSource for Box<dyn StopSource> {
    fn stop_requested(&mut self) -> bool {
        self.as_mut().stop_requested()
    }
}

/// A source that never asks to stop; runs always complete naturally.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSource for NeverStop {
    fn stop_requested(&mut self) -> bool {
        false
    }
}

/// Programmatic stop handle. Clones share the same request flag, so one clone
/// can be handed to the watcher while another is kept to request the stop.
#[derive(Debug, Clone, Default)]
pub struct ManualStop {
    requested: Arc<AtomicBool>,
}

impl ManualStop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

impl StopSource for ManualStop {
    fn stop_requested(&mut self) -> bool {
        self.is_requested()
    }
}

/// Requests a stop once a fixed duration has passed since creation.
#[derive(Debug, Clone, Copy)]
pub struct StopAfter {
    deadline: Instant,
}

impl StopAfter {
    #[must_use]
    pub fn new(after: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(after).unwrap_or(now),
        }
    }
}

impl StopSource for StopAfter {
    fn stop_requested(&mut self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Requests a stop as soon as any of its sources does.
#[derive(Default)]
pub struct AnyStop {
    sources: Vec<Box<dyn StopSource>>,
}

impl AnyStop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, source: impl StopSource) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl StopSource for AnyStop {
    fn stop_requested(&mut self) -> bool {
        self.sources.iter_mut().any(|source| source.stop_requested())
    }
}

/// Spawns the background watcher. It polls `source` every
/// [`WATCH_POLL_INTERVAL`], trips `signal` on the first request and exits.
/// It also exits once the signal trips elsewhere or `done` is set.
pub fn spawn_stop_watcher<S>(mut source: S, signal: StopSignal, done: Arc<AtomicBool>) -> JoinHandle<()>
where
    S: StopSource,
{
    tokio::task::spawn_blocking(move || {
        while !signal.is_tripped() && !done.load(Ordering::Acquire) {
            if source.stop_requested() {
                if signal.trip() {
                    warn!("Stop requested; workers will finish their current request and exit.");
                }
                break;
            }
            std::thread::sleep(WATCH_POLL_INTERVAL);
        }
        debug!("Stop watcher exited.");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::test_support::run_async_test;

    const WATCHER_TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn trip_is_edge_triggered() -> Result<(), String> {
        let signal = StopSignal::new();
        let other = signal.clone();
        if signal.is_tripped() {
            return Err("New signal must not be tripped".to_owned());
        }
        if !other.trip() {
            return Err("First trip must report the transition".to_owned());
        }
        if signal.trip() {
            return Err("Second trip must be a no-op".to_owned());
        }
        if !signal.is_tripped() {
            return Err("Clone must observe the trip".to_owned());
        }
        Ok(())
    }

    #[test]
    fn tripped_resolves_for_late_waiters() -> Result<(), String> {
        run_async_test(async {
            let signal = StopSignal::new();
            signal.trip();
            tokio::time::timeout(WATCHER_TIMEOUT, signal.tripped())
                .await
                .map_err(|err| format!("tripped() did not resolve: {}", err))
        })
    }

    #[test]
    fn tripped_wakes_pending_waiters() -> Result<(), String> {
        run_async_test(async {
            let signal = StopSignal::new();
            let waiter = {
                let signal = signal.clone();
                tokio::spawn(async move { signal.tripped().await })
            };
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.trip();
            tokio::time::timeout(WATCHER_TIMEOUT, waiter)
                .await
                .map_err(|err| format!("Waiter not woken: {}", err))?
                .map_err(|err| format!("Waiter join error: {}", err))
        })
    }

    #[test]
    fn watcher_trips_on_manual_request() -> Result<(), String> {
        run_async_test(async {
            let signal = StopSignal::new();
            let stop = ManualStop::new();
            let done = Arc::new(AtomicBool::new(false));
            let handle = spawn_stop_watcher(stop.clone(), signal.clone(), done);

            stop.request();
            tokio::time::timeout(WATCHER_TIMEOUT, handle)
                .await
                .map_err(|err| format!("Watcher did not exit: {}", err))?
                .map_err(|err| format!("Watcher join error: {}", err))?;
            if !signal.is_tripped() {
                return Err("Watcher must trip the signal".to_owned());
            }
            Ok(())
        })
    }

    #[test]
    fn watcher_exits_when_done_without_tripping() -> Result<(), String> {
        run_async_test(async {
            let signal = StopSignal::new();
            let done = Arc::new(AtomicBool::new(false));
            let handle = spawn_stop_watcher(NeverStop, signal.clone(), Arc::clone(&done));

            done.store(true, Ordering::Release);
            tokio::time::timeout(WATCHER_TIMEOUT, handle)
                .await
                .map_err(|err| format!("Watcher did not exit: {}", err))?
                .map_err(|err| format!("Watcher join error: {}", err))?;
            if signal.is_tripped() {
                return Err("Watcher must not trip without a request".to_owned());
            }
            Ok(())
        })
    }

    #[test]
    fn stop_after_and_any_stop() -> Result<(), String> {
        let mut immediate = StopAfter::new(Duration::ZERO);
        if !immediate.stop_requested() {
            return Err("Zero delay must request a stop".to_owned());
        }
        let mut later = StopAfter::new(Duration::from_secs(3600));
        if later.stop_requested() {
            return Err("Deadline in the future must not request a stop".to_owned());
        }

        let manual = ManualStop::new();
        let mut any = AnyStop::new().with(NeverStop).with(manual.clone());
        if any.stop_requested() {
            return Err("No source requested a stop yet".to_owned());
        }
        manual.request();
        if !any.stop_requested() {
            return Err("Any source requesting must stop".to_owned());
        }
        Ok(())
    }
}
