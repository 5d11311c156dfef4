use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll, read};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{debug, warn};

use loadrunner::runner::{ManualStop, StopSource};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Stops a run when `S`/`s` or Ctrl+C is pressed. Polls without blocking;
/// the stop watcher supplies the cadence.
#[derive(Debug, Default)]
pub struct KeyboardStopSource;

impl StopSource for KeyboardStopSource {
    fn stop_requested(&mut self) -> bool {
        while poll(Duration::ZERO).unwrap_or_default() {
            match read() {
                Ok(Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    ..
                })) if is_stop_key(code, modifiers) => return true,
                Ok(_) => {}
                Err(err) => {
                    debug!("Keyboard read failed: {}", err);
                    return false;
                }
            }
        }
        false
    }
}

pub(crate) fn is_stop_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        code == KeyCode::Char('c')
    } else {
        matches!(code, KeyCode::Char('s' | 'S'))
    }
}

/// Raw mode for the duration of a run, so single key presses reach the
/// keyboard source. Restored on drop.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            eprintln!("Failed to restore terminal mode: {}", err);
        }
    }
}

/// Requests a stop on Ctrl+C or SIGTERM. Abort the handle once the run ends.
pub fn spawn_signal_stop_handler(stop: ManualStop) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        warn!("Failed to listen for Ctrl+C: {}", err);
                        return;
                    }
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {}
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", err);
                return;
            }
        }

        stop.request();
    })
}
