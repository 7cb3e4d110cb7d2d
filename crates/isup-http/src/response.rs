//! Normalized HTTP response

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::status::SyntheticStatus;

/// Outcome of a call, whether it came from the network or from a mock registry.
///
/// A `status_code` of 0 with an empty `error` means the request could not be built.
/// Codes 1 and 2 are synthetic, see [`SyntheticStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub url: String,
    pub method: String,
    pub status_code: u16,
    pub body: String,
    pub response_time_ms: f64,
    pub content_length: i64,
    pub content_type: String,
    pub headers: HashMap<String, String>,
    pub error: String,
}

impl Response {
    /// Response returned for a mock lookup that has no entry
    pub fn not_found(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status_code: 404,
            ..Default::default()
        }
    }

    /// Response for a transport failure classified as `status`
    pub fn synthetic(status: SyntheticStatus) -> Self {
        Self {
            status_code: status.code(),
            error: status.canonical_text().to_string(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic_status().is_some()
    }

    pub fn synthetic_status(&self) -> Option<SyntheticStatus> {
        SyntheticStatus::from_code(self.status_code)
    }

    /// Deserialize the body text as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Normalize a completed transport response.
    ///
    /// The body is read to the end; the underlying connection is released when
    /// `response` is dropped, whether or not the read succeeded.
    pub(crate) async fn from_transport(response: reqwest::Response, method: &str) -> Self {
        let status_code = response.status().as_u16();
        let url = response.url().to_string();
        let reported_length = response.content_length();
        let headers = flatten_headers(response.headers());
        let content_type = headers
            .get(CONTENT_TYPE.as_str())
            .cloned()
            .unwrap_or_default();

        let body = match response.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Failed to read response body from {}: {}", url, e);
                String::new()
            }
        };

        let content_length = reported_length
            .and_then(|len| i64::try_from(len).ok())
            .unwrap_or(body.len() as i64);

        Self {
            url,
            method: method.to_string(),
            status_code,
            body,
            response_time_ms: 0.0,
            content_length,
            content_type,
            headers,
            error: String::new(),
        }
    }
}

/// Collapse a header map into one string per name, repeated values joined with `", "`
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match flat.entry(name.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    flat
}
