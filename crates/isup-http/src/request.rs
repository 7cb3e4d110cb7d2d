//! Request builder
//!
//! A [`Request`] is a plain value. Every setter consumes the request and returns the
//! updated one, so a request that was cloned before a setter call never observes the change.
//! Map-valued fields merge: later entries overwrite earlier ones key by key.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::error::RequestError;
use crate::value::Value;

/// Timeout used when none is set, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
/// Smallest timeout a request can carry, in milliseconds
pub const MIN_TIMEOUT_MS: u64 = 50;
/// Largest timeout a request can carry, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 60000;

/// Name of the header written by [`Request::set_content_type`]
pub const CONTENT_TYPE_HEADER: &str = "Content-type";
/// Name of the header written by [`Request::set_accept`]
pub const ACCEPT_HEADER: &str = "Accept";
/// Name of the header written by [`Request::set_authorization`]
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Description of an HTTP call before it is executed.
///
/// Certificate validation is on unless [`Request::set_insecure_request`] turns it off.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    url: String,
    method: String,
    headers: BTreeMap<String, Value>,
    body: BTreeMap<String, Value>,
    query_params: BTreeMap<String, Value>,
    insecure_request: bool,
    timeout_ms: u64,
}

/// A request in the form the transport consumes
#[derive(Debug)]
pub struct RenderedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// JSON payload; `None` when the body map is empty
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Create a request for `method` and `url`.
    ///
    /// The method is uppercased; the timeout starts at [`DEFAULT_TIMEOUT_MS`].
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.as_ref().to_uppercase(),
            headers: BTreeMap::new(),
            body: BTreeMap::new(),
            query_params: BTreeMap::new(),
            insecure_request: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Merge `headers` into the request headers
    pub fn set_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        merge(&mut self.headers, headers);
        self
    }

    /// Set a single header, replacing any previous value under the same name
    pub fn set_header_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn set_content_type(self, value: impl Into<Value>) -> Self {
        self.set_header_value(CONTENT_TYPE_HEADER, value)
    }

    pub fn set_accept(self, value: impl Into<Value>) -> Self {
        self.set_header_value(ACCEPT_HEADER, value)
    }

    pub fn set_authorization(self, value: impl Into<Value>) -> Self {
        self.set_header_value(AUTHORIZATION_HEADER, value)
    }

    /// Merge `body` into the fields sent as the JSON payload
    pub fn set_body<I, K, V>(mut self, body: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        merge(&mut self.body, body);
        self
    }

    /// Merge `query_params` into the parameters appended to the URL
    pub fn set_query_params<I, K, V>(mut self, query_params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        merge(&mut self.query_params, query_params);
        self
    }

    /// Skip certificate validation when `insecure` is true
    pub fn set_insecure_request(mut self, insecure: bool) -> Self {
        self.insecure_request = insecure;
        self
    }

    /// Set the call timeout in milliseconds.
    ///
    /// Zero leaves the current timeout in place. Anything else is clamped to
    /// [`MIN_TIMEOUT_MS`]..=[`MAX_TIMEOUT_MS`].
    pub fn set_timeout(mut self, timeout_ms: u64) -> Self {
        if timeout_ms != 0 {
            self.timeout_ms = timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        }
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &BTreeMap<String, Value> {
        &self.headers
    }

    pub fn body(&self) -> &BTreeMap<String, Value> {
        &self.body
    }

    pub fn query_params(&self) -> &BTreeMap<String, Value> {
        &self.query_params
    }

    pub fn insecure_request(&self) -> bool {
        self.insecure_request
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The URL with the query parameters appended.
    ///
    /// With no query parameters the URL is returned untouched. Otherwise a `?` is added
    /// when the URL has none and each parameter follows as `key=value`, joined by `&`.
    pub fn url_with_query_params(&self) -> String {
        let mut url = self.url.clone();
        if self.query_params.is_empty() {
            return url;
        }

        if !url.contains('?') {
            url.push('?');
        }

        for (key, value) in &self.query_params {
            if !url.ends_with('?') && !url.ends_with('&') {
                url.push('&');
            }
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(&value.to_string()));
        }

        url
    }

    /// Produce the transport-ready form of this request.
    ///
    /// Fails when the method, URL, a header or the body cannot be represented.
    pub fn render(&self) -> Result<RenderedRequest, RequestError> {
        let method = if self.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(self.method.as_bytes())
                .map_err(|_| RequestError::InvalidMethod(self.method.clone()))?
        };

        let raw_url = self.url_with_query_params();
        let url = Url::parse(&raw_url).map_err(|e| RequestError::InvalidUrl {
            url: raw_url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(RequestError::InvalidUrl {
                url: raw_url,
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| RequestError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(&value.to_string()).map_err(|e| {
                RequestError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            headers.insert(header_name, header_value);
        }

        let body = if self.body.is_empty() {
            None
        } else {
            if let Some((key, _)) = self.body.iter().find(|(_, v)| !v.is_serializable()) {
                return Err(RequestError::Body(format!(
                    "field {key} is not a finite number"
                )));
            }
            Some(serde_json::to_vec(&self.body)?)
        };

        Ok(RenderedRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Shorthand for [`Request::new`]
pub fn create_request(method: impl AsRef<str>, url: impl Into<String>) -> Request {
    Request::new(method, url)
}

fn merge<I, K, V>(target: &mut BTreeMap<String, Value>, entries: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    target.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
}
