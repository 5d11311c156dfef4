use std::sync::{Mutex, PoisonError};

/// Number of error entries surfaced in a run summary.
pub const ERROR_SAMPLE_LIMIT: usize = 10;

/// Append-only, thread-safe collection of error records. Every entry is kept;
/// the sample limit only applies to [`ErrorSink::snapshot`].
#[derive(Debug, Default)]
pub struct ErrorSink {
    entries: Mutex<Vec<String>>,
}

/// First [`ERROR_SAMPLE_LIMIT`] entries plus the total number recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSnapshot {
    pub samples: Vec<String>,
    pub total: usize,
}

impl ErrorSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn snapshot(&self) -> ErrorSnapshot {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        ErrorSnapshot {
            samples: entries.iter().take(ERROR_SAMPLE_LIMIT).cloned().collect(),
            total: entries.len(),
        }
    }

    /// All recorded entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Formats an error record as `[worker:index] detail`.
#[must_use]
pub fn error_record(worker_id: usize, seq_index: u64, detail: &str) -> String {
    format!("[{}:{}] {}", worker_id, seq_index, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn snapshot_caps_samples_but_keeps_count() -> Result<(), String> {
        let sink = ErrorSink::new();
        for idx in 0..25u64 {
            sink.record(error_record(1, idx, "boom"));
        }
        let snapshot = sink.snapshot();
        if snapshot.samples.len() != ERROR_SAMPLE_LIMIT {
            return Err(format!("Unexpected sample size {}", snapshot.samples.len()));
        }
        if snapshot.total != 25 || sink.len() != 25 {
            return Err(format!("Unexpected total {}", snapshot.total));
        }
        if snapshot.samples.first().map(String::as_str) != Some("[1:0] boom") {
            return Err("Samples must keep insertion order".to_owned());
        }
        Ok(())
    }

    #[test]
    fn concurrent_records_are_not_lost() -> Result<(), String> {
        let sink = Arc::new(ErrorSink::new());
        let handles: Vec<_> = (1..=8usize)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for idx in 1..=100u64 {
                        sink.record(error_record(worker, idx, "x"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle
                .join()
                .map_err(|_panic| "Recorder thread panicked".to_owned())?;
        }
        if sink.len() != 800 {
            return Err(format!("Expected 800 entries, got {}", sink.len()));
        }

        // Per-worker insertion order survives interleaving.
        let entries = sink.entries();
        let worker_three: Vec<&String> = entries
            .iter()
            .filter(|entry| entry.starts_with("[3:"))
            .collect();
        let in_order = worker_three
            .iter()
            .zip(1..=100u64)
            .all(|(entry, idx)| **entry == error_record(3, idx, "x"));
        if worker_three.len() != 100 || !in_order {
            return Err("Worker entries out of order".to_owned());
        }
        Ok(())
    }

    #[test]
    fn empty_sink_snapshot() -> Result<(), String> {
        let sink = ErrorSink::new();
        if !sink.is_empty() || sink.snapshot() != ErrorSnapshot::default() {
            return Err("Expected empty snapshot".to_owned());
        }
        Ok(())
    }
}
