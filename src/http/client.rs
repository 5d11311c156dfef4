use std::time::Duration;

use reqwest::Client;

use crate::args::{
    DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_USER_AGENT, LoadArgs,
};
use crate::error::HttpError;

use super::transport::ReqwestTransport;

/// Connection pool and timeout settings for the shared client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn from_args(args: &LoadArgs) -> Self {
        Self {
            request_timeout: args.request_timeout,
            connect_timeout: args.connect_timeout,
            ..Self::default()
        }
    }
}

/// Builds the pooled client shared by all workers. Decompression is handled
/// here so workers only ever see decoded bodies.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialized.
pub fn build_client(settings: &ClientSettings) -> Result<Client, HttpError> {
    let mut builder = Client::builder()
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .pool_max_idle_per_host(settings.pool_max_idle_per_host)
        .pool_idle_timeout(Some(settings.pool_idle_timeout))
        .gzip(true)
        .deflate(true);

    if let Some(user_agent) = settings.user_agent.as_deref() {
        builder = builder.user_agent(user_agent);
    }

    builder
        .build()
        .map_err(|err| HttpError::BuildClientFailed { source: err })
}

/// Builds a [`ReqwestTransport`] from `settings`.
///
/// # Errors
///
/// Returns an error when the client cannot be built.
pub fn build_transport(settings: &ClientSettings) -> Result<ReqwestTransport, HttpError> {
    build_client(settings).map(ReqwestTransport::new)
}
