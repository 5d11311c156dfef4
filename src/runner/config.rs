use std::time::Duration;

use crate::args::{CredentialPlacement, HttpMethod, PositiveU64, PositiveUsize};
use crate::http::non_blank;

/// Fully validated parameters of one load run. Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub url: String,
    pub method: HttpMethod,
    pub credential: Option<String>,
    pub credential_placement: CredentialPlacement,
    pub concurrency: PositiveUsize,
    pub requests_per_worker: PositiveU64,
    pub delay: Duration,
    pub body: Option<String>,
}

impl RunConfig {
    /// A run of one worker issuing one request, with no delay.
    #[must_use]
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            credential: None,
            credential_placement: CredentialPlacement::default(),
            concurrency: PositiveUsize::MIN,
            requests_per_worker: PositiveU64::MIN,
            delay: Duration::ZERO,
            body: None,
        }
    }

    #[must_use]
    pub const fn with_load(
        mut self,
        concurrency: PositiveUsize,
        requests_per_worker: PositiveU64,
    ) -> Self {
        self.concurrency = concurrency;
        self.requests_per_worker = requests_per_worker;
        self
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_credential(
        mut self,
        credential: Option<String>,
        placement: CredentialPlacement,
    ) -> Self {
        self.credential = credential;
        self.credential_placement = placement;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// The credential, unless it is missing or blank.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        non_blank(self.credential.as_deref())
    }

    /// Upper bound on attempted requests: `concurrency * requests_per_worker`.
    #[must_use]
    pub fn planned_requests(&self) -> u64 {
        u64::try_from(self.concurrency.get())
            .unwrap_or(u64::MAX)
            .saturating_mul(self.requests_per_worker.get())
    }
}
