//! Turns a run's parameters into one concrete request.
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tracing::warn;

use crate::args::HttpMethod;

/// Query parameter carrying the credential on bodyless requests.
pub const CREDENTIAL_QUERY_PARAM: &str = "bootKey";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Everything except RFC 3986 unreserved characters (`A-Z a-z 0-9 - . _ ~`).
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Synthetic body sent when no explicit body is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub measurement_id: String,
    pub timestamp_utc: DateTime<Utc>,
    pub inputs: PayloadInputs,
    #[serde(rename = "bootKey")]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayloadInputs {
    pub worker: usize,
    pub index: u64,
}

impl RequestPayload {
    #[must_use]
    pub fn new(worker_id: usize, seq_index: u64, credential: Option<&str>) -> Self {
        Self {
            measurement_id: measurement_id(worker_id, seq_index),
            timestamp_utc: Utc::now(),
            inputs: PayloadInputs {
                worker: worker_id,
                index: seq_index,
            },
            credential: non_blank(credential).map(str::to_owned),
        }
    }
}

/// `<worker:03>-<index:05>`, e.g. `007-00042`.
#[must_use]
pub fn measurement_id(worker_id: usize, seq_index: u64) -> String {
    format!("{:03}-{:05}", worker_id, seq_index)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRequest {
    pub url: String,
    pub body: Option<String>,
    pub content_type: Option<&'static str>,
}

impl BuiltRequest {
    const fn bodyless(url: String) -> Self {
        Self {
            url,
            body: None,
            content_type: None,
        }
    }
}

/// Builds the URL and body for request `seq_index` of worker `worker_id`.
///
/// Body-carrying methods send `explicit_body` verbatim when it is non-empty and
/// a fresh [`RequestPayload`] otherwise; their URL is never touched. Bodyless
/// methods carry the credential as the `bootKey` query parameter instead.
#[must_use]
pub fn build_request(
    method: HttpMethod,
    base_url: &str,
    worker_id: usize,
    seq_index: u64,
    credential: Option<&str>,
    explicit_body: Option<&str>,
) -> BuiltRequest {
    if !method.carries_body() {
        let url = match non_blank(credential) {
            Some(value) => append_query(base_url, CREDENTIAL_QUERY_PARAM, value),
            None => base_url.to_owned(),
        };
        return BuiltRequest::bodyless(url);
    }

    if let Some(body) = explicit_body.filter(|body| !body.is_empty()) {
        return BuiltRequest {
            url: base_url.to_owned(),
            body: Some(body.to_owned()),
            content_type: Some(JSON_CONTENT_TYPE),
        };
    }

    let payload = RequestPayload::new(worker_id, seq_index, credential);
    match serde_json::to_string(&payload) {
        Ok(body) => BuiltRequest {
            url: base_url.to_owned(),
            body: Some(body),
            content_type: Some(JSON_CONTENT_TYPE),
        },
        Err(err) => {
            warn!("Failed to serialize payload {}: {}", payload.measurement_id, err);
            BuiltRequest::bodyless(base_url.to_owned())
        }
    }
}

/// Appends `name=value` to the query, keeping any fragment at the end.
#[must_use]
pub fn append_query(url: &str, name: &str, value: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    let mut out = format!(
        "{}{}{}={}",
        base,
        separator,
        utf8_percent_encode(name, QUERY_ENCODE_SET),
        utf8_percent_encode(value, QUERY_ENCODE_SET)
    );
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
