//! One sequential stream of requests.
use std::sync::Arc;

use tokio::time::sleep;
use tracing::debug;

use crate::args::CredentialPlacement;
use crate::http::{OutboundRequest, Transport, TransportResponse, build_request};

use super::cancel::StopSignal;
use super::config::RunConfig;
use super::errors::{ErrorSink, error_record};

/// Success and failure counts of one worker. Returned once, on completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTally {
    pub success: u64,
    pub failure: u64,
}

impl WorkerTally {
    #[must_use]
    pub const fn attempted(&self) -> u64 {
        self.success.saturating_add(self.failure)
    }

    /// Folds two tallies. Associative and commutative.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            success: self.success.saturating_add(other.success),
            failure: self.failure.saturating_add(other.failure),
        }
    }
}

enum Attempt {
    Success,
    Failure(String),
    Stopped,
}

pub struct Worker {
    id: usize,
    config: Arc<RunConfig>,
    transport: Arc<dyn Transport>,
    errors: Arc<ErrorSink>,
    stop: StopSignal,
}

impl Worker {
    #[must_use]
    pub fn new(
        id: usize,
        config: Arc<RunConfig>,
        transport: Arc<dyn Transport>,
        errors: Arc<ErrorSink>,
        stop: StopSignal,
    ) -> Self {
        Self {
            id,
            config,
            transport,
            errors,
            stop,
        }
    }

    /// Issues up to `requests_per_worker` requests one at a time. Individual
    /// failures are tallied and recorded, never returned; a tripped stop
    /// signal ends the loop without counting the interrupted attempt.
    pub async fn run(self) -> WorkerTally {
        let total = self.config.requests_per_worker.get();
        let delay = self.config.delay;
        let mut tally = WorkerTally::default();

        for seq_index in 1..=total {
            if self.stop.is_tripped() {
                break;
            }

            match self.attempt(seq_index).await {
                Attempt::Success => tally.success = tally.success.saturating_add(1),
                Attempt::Failure(detail) => {
                    tally.failure = tally.failure.saturating_add(1);
                    debug!("Worker {} request {} failed: {}", self.id, seq_index, detail);
                    self.errors
                        .record(error_record(self.id, seq_index, &detail));
                }
                Attempt::Stopped => break,
            }

            if seq_index < total && !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = self.stop.tripped() => break,
                    () = sleep(delay) => {}
                }
            }
        }

        debug!(
            "Worker {} finished: {} ok, {} failed",
            self.id, tally.success, tally.failure
        );
        tally
    }

    async fn attempt(&self, seq_index: u64) -> Attempt {
        let request = self.outbound_request(seq_index);
        let sent = tokio::select! {
            biased;
            () = self.stop.tripped() => return Attempt::Stopped,
            result = self.transport.send(request) => result,
        };

        match sent {
            Ok(response) if response.is_success() => Attempt::Success,
            Ok(response) => {
                let status = response.status();
                let reason = response.reason().to_owned();
                let body = self.read_body_snippet(response).await;
                Attempt::Failure(format!("HTTP {} {} - {}", status, reason, body))
            }
            Err(err) => Attempt::Failure(err.to_string()),
        }
    }

    /// Best-effort body read; any failure or a stop yields an empty string.
    async fn read_body_snippet(&self, response: TransportResponse) -> String {
        tokio::select! {
            biased;
            () = self.stop.tripped() => String::new(),
            body = response.read_text() => body
                .map(|text| text.trim().to_owned())
                .unwrap_or_default(),
        }
    }

    fn outbound_request(&self, seq_index: u64) -> OutboundRequest {
        let config = &self.config;
        let credential_in_header = config.method.carries_body()
            && config.credential_placement == CredentialPlacement::Header;
        let builder_credential = if credential_in_header {
            None
        } else {
            config.credential()
        };

        let built = build_request(
            config.method,
            &config.url,
            self.id,
            seq_index,
            builder_credential,
            config.body.as_deref(),
        );

        let mut headers = Vec::with_capacity(2);
        if let Some(content_type) = built.content_type {
            headers.push(("Content-Type".to_owned(), content_type.to_owned()));
        }
        if credential_in_header && let Some(credential) = config.credential() {
            headers.push(("Authorization".to_owned(), credential.to_owned()));
        }

        OutboundRequest {
            method: config.method,
            url: built.url,
            headers,
            body: built.body,
        }
    }
}
