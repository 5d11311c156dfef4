//! Stub transports for exercising workers and runs without a network.
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::http::{
    OutboundRequest, ResponseBody, Transport, TransportError, TransportErrorKind,
    TransportResponse,
};

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

pub(crate) struct TextBody(pub(crate) Result<String, TransportError>);

#[async_trait]
impl ResponseBody for TextBody {
    async fn read_text(self: Box<Self>) -> Result<String, TransportError> {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16, &'static str, &'static str),
    BrokenBody(u16),
    Error(TransportErrorKind, &'static str),
}

/// Answers every request with the same reply, optionally after a latency,
/// and remembers what it was sent.
pub(crate) struct StubTransport {
    reply: Reply,
    latency: Duration,
    sent: AtomicU64,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl StubTransport {
    pub(crate) const fn new(reply: Reply) -> Self {
        Self {
            reply,
            latency: Duration::ZERO,
            sent: AtomicU64::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) const fn ok() -> Self {
        Self::new(Reply::Status(200, "OK", ""))
    }

    pub(crate) const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.reply {
            Reply::Status(status, reason, body) => Ok(TransportResponse::new(
                *status,
                *reason,
                Box::new(TextBody(Ok((*body).to_owned()))),
            )),
            Reply::BrokenBody(status) => Ok(TransportResponse::new(
                *status,
                "Broken",
                Box::new(TextBody(Err(TransportError::new(
                    TransportErrorKind::Body,
                    "stream reset",
                )))),
            )),
            Reply::Error(kind, message) => Err(TransportError::new(*kind, *message)),
        }
    }
}

/// Fails every `every`-th request (by arrival order) with a 500.
pub(crate) struct FlakyTransport {
    every: u64,
    seen: AtomicU64,
}

impl FlakyTransport {
    pub(crate) const fn new(every: u64) -> Self {
        Self {
            every,
            seen: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn send(&self, _request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        let failing = self.every > 0 && seen.checked_rem(self.every) == Some(0);
        let (status, reason) = if failing {
            (500, "Internal Server Error")
        } else {
            (200, "OK")
        };
        Ok(TransportResponse::new(
            status,
            reason,
            Box::new(TextBody(Ok("  oops \n".to_owned()))),
        ))
    }
}
