use std::time::Duration;

use serde::Deserialize;

use crate::args::{CredentialPlacement, HttpMethod, OutputFormat};
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    #[serde(alias = "boot_key", alias = "credential")]
    pub key: Option<String>,
    pub credential_placement: Option<CredentialPlacement>,
    #[serde(alias = "threads", alias = "workers")]
    pub concurrency: Option<usize>,
    #[serde(alias = "requests_per_worker", alias = "per_thread")]
    pub requests: Option<u64>,
    pub delay: Option<DurationValue>,
    pub data: Option<String>,
    pub data_file: Option<String>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub output_format: Option<OutputFormat>,
    pub no_keyboard: Option<bool>,
    pub api: Option<ApiSection>,
}

impl ConfigFile {
    /// Top-level `url` wins over the `[api]` section.
    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.api.as_ref().and_then(|api| api.url.as_deref()))
    }
}

/// The `[api]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiSection {
    #[serde(alias = "Url")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
