//! HTTP client implementation

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    config::HttpConfig,
    error::{HttpError, Result},
    mock::MockRegistry,
    request::Request,
    response::Response,
    status::SyntheticStatus,
};

/// Mockable HTTP caller trait
#[async_trait]
pub trait HttpCaller: Send + Sync {
    /// Execute `request` and normalize the outcome.
    ///
    /// Failures are reported through the returned [`Response`], never as an error.
    async fn call(&self, request: &Request) -> Response;
}

/// Production HTTP client.
///
/// Holds no per-call state apart from the mock registry, which may be shared
/// with other clients and used from many tasks at once.
#[derive(Debug)]
pub struct HttpClient {
    config: HttpConfig,
    mocks: Arc<MockRegistry>,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> Self {
        let mocks = Arc::new(MockRegistry::with_enabled(config.mock_enabled));
        Self { config, mocks }
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> Self {
        Self::new(HttpConfig::default())
    }

    /// Create a client answering mock calls from an existing registry.
    ///
    /// The registry's own mock toggle is kept; `config.mock_enabled` is ignored.
    pub fn with_mock_registry(config: HttpConfig, mocks: Arc<MockRegistry>) -> Self {
        Self { config, mocks }
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn mock_registry(&self) -> &Arc<MockRegistry> {
        &self.mocks
    }

    /// Register a canned response for `method` and `url`
    pub fn add_mock_response(&self, response: Response, method: &str, url: &str) {
        self.mocks.add(response, method, url);
    }

    /// Canned response for `method` and `url`, or a 404 when none is registered
    pub fn get_mock_response(&self, method: &str, url: &str) -> Response {
        self.mocks.lookup(method, url)
    }

    /// Enable or disable mock mode
    pub fn set_mock_enabled(&self, enabled: bool) {
        self.mocks.set_enabled(enabled);
    }

    pub fn is_mock_enabled(&self) -> bool {
        self.mocks.is_enabled()
    }

    /// Transport client bound to the request's timeout and certificate policy
    fn transport_for(&self, request: &Request) -> Result<reqwest::Client> {
        let timeout = request.timeout();
        reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .tcp_keepalive(timeout)
            .pool_idle_timeout(timeout)
            .danger_accept_invalid_certs(request.insecure_request())
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| HttpError::BuildError(error_chain(&e)))
    }

    async fn execute(&self, request: &Request) -> Response {
        let rendered = match request.render() {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Cannot build {} {}: {}", request.method(), request.url(), e);
                return Response {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    ..Default::default()
                };
            }
        };

        let url = rendered.url.to_string();
        let transport = match self.transport_for(request) {
            Ok(transport) => transport,
            Err(e) => {
                warn!("{}", e);
                return Response {
                    method: request.method().to_string(),
                    url,
                    error: e.to_string(),
                    ..Default::default()
                };
            }
        };

        let mut builder = transport
            .request(rendered.method, rendered.url)
            .headers(rendered.headers);
        if let Some(body) = rendered.body {
            builder = builder.body(body);
        }

        let start = Instant::now();
        let outcome = builder.send().await;
        let elapsed_ms = start.elapsed().as_millis() as f64;

        match outcome {
            Ok(transport_response) => {
                let mut response =
                    Response::from_transport(transport_response, request.method()).await;
                response.response_time_ms = elapsed_ms;
                debug!(
                    "HTTP {} {} -> {} in {}ms",
                    response.method, response.url, response.status_code, elapsed_ms
                );
                response
            }
            Err(e) => {
                let failure = classify_failure(&e);
                warn!(
                    "HTTP {} {} failed after {}ms: {}",
                    request.method(),
                    url,
                    elapsed_ms,
                    failure.description()
                );
                let mut response = failure.into_response();
                response.method = request.method().to_string();
                response.url = url;
                response.response_time_ms = elapsed_ms;
                response
            }
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl HttpCaller for HttpClient {
    async fn call(&self, request: &Request) -> Response {
        if self.mocks.is_enabled() {
            return self.mocks.lookup(request.method(), request.url());
        }

        debug!("HTTP {}: {}", request.method(), request.url());
        self.execute(request).await
    }
}

/// Create a shared HTTP client (Arc-wrapped for cloning)
pub fn shared_client(config: HttpConfig) -> Arc<dyn HttpCaller> {
    Arc::new(HttpClient::new(config))
}

/// How a transport failure is reported
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransportFailure {
    Synthetic(SyntheticStatus),
    Other(String),
}

impl TransportFailure {
    fn description(&self) -> &str {
        match self {
            TransportFailure::Synthetic(status) => status.canonical_text(),
            TransportFailure::Other(text) => text,
        }
    }

    fn into_response(self) -> Response {
        match self {
            TransportFailure::Synthetic(status) => Response::synthetic(status),
            TransportFailure::Other(error) => Response {
                error,
                ..Default::default()
            },
        }
    }
}

/// Map a transport error onto the synthetic status taxonomy.
///
/// reqwest does not say which phase a deadline hit, so a connect or TLS handshake
/// timeout is reported as [`SyntheticStatus::Timeout`] just like a wait for response
/// headers. Certificate failures are recognized by the rustls error type only, never
/// by message text, since reqwest's messages embed the request URL.
fn classify_failure(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() || chain_has_timeout(err) {
        TransportFailure::Synthetic(SyntheticStatus::Timeout)
    } else if is_certificate_error(err) {
        TransportFailure::Synthetic(SyntheticStatus::InvalidCertificate)
    } else {
        TransportFailure::Other(error_chain(err))
    }
}

fn sources<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

fn chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    sources(err).any(|e| {
        e.downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
    })
}

/// Whether any error in the chain is a rustls certificate rejection.
///
/// tokio-rustls hands the rustls error over inside an `io::Error`, whose `source()`
/// skips the wrapped value, so the inner error is reached through `get_ref`.
fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    sources(err).any(|e| {
        let tls_error = e.downcast_ref::<rustls::Error>().or_else(|| {
            e.downcast_ref::<std::io::Error>()
                .and_then(|io| io.get_ref())
                .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        });
        matches!(tls_error, Some(rustls::Error::InvalidCertificate(_)))
    })
}

/// Every message in the chain, outermost first, joined with `": "`
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = String::new();
    for e in sources(err) {
        let message = e.to_string();
        if text.contains(&message) {
            continue;
        }
        if !text.is_empty() {
            text.push_str(": ");
        }
        text.push_str(&message);
    }
    text
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<dyn StdError + 'static>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref()
        }
    }

    fn layered(outer: &'static str, inner: Box<dyn StdError + 'static>) -> Layer {
        Layer {
            message: outer,
            source: Some(inner),
        }
    }

    fn rejected_certificate() -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        )
    }

    #[test]
    fn test_certificate_error_found_inside_io_error() {
        let err = layered(
            "error sending request for url (https://127.0.0.1/)",
            Box::new(rejected_certificate()),
        );
        assert!(is_certificate_error(&err));
    }

    #[test]
    fn test_bare_rustls_certificate_error_found_in_chain() {
        let err = layered(
            "error trying to connect",
            Box::new(rustls::Error::InvalidCertificate(
                rustls::CertificateError::Expired,
            )),
        );
        assert!(is_certificate_error(&err));
    }

    #[test]
    fn test_other_tls_errors_are_not_certificate_errors() {
        let err = layered(
            "error trying to connect",
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                rustls::Error::DecryptError,
            )),
        );
        assert!(!is_certificate_error(&err));
    }

    #[test]
    fn test_certificate_word_in_message_is_not_certificate_error() {
        let err = layered(
            "error sending request for url (http://127.0.0.1:9/api/certificates)",
            Box::new(Layer {
                message: "invalid peer certificate",
                source: Some(Box::new(std::io::Error::from(
                    std::io::ErrorKind::ConnectionRefused,
                ))),
            }),
        );
        assert!(!is_certificate_error(&err));
    }

    #[test]
    fn test_connection_refused_is_not_certificate_error() {
        let err = layered(
            "error trying to connect",
            Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
        );
        assert!(!is_certificate_error(&err));
        assert!(!chain_has_timeout(&err));
    }

    #[test]
    fn test_io_timeout_found_in_chain() {
        let err = layered(
            "error trying to connect",
            Box::new(std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline")),
        );
        assert!(chain_has_timeout(&err));
    }

    #[test]
    fn test_error_chain_joins_messages() {
        let err = layered(
            "error sending request",
            Box::new(layered(
                "client error (Connect)",
                Box::new(Layer {
                    message: "Connection refused",
                    source: None,
                }),
            )),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: client error (Connect): Connection refused"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_messages() {
        let err = layered(
            "dns error: no such host",
            Box::new(Layer {
                message: "no such host",
                source: None,
            }),
        );
        assert_eq!(error_chain(&err), "dns error: no such host");
    }

    #[test]
    fn test_failure_into_response() {
        let response = TransportFailure::Synthetic(SyntheticStatus::Timeout).into_response();
        assert_eq!(response.status_code, 1);
        assert_eq!(response.error, "Request Timeout");

        let response =
            TransportFailure::Synthetic(SyntheticStatus::InvalidCertificate).into_response();
        assert_eq!(response.status_code, 2);
        assert_eq!(response.error, "Invalid SSL Certificate");

        let response = TransportFailure::Other("connection refused".to_string()).into_response();
        assert_eq!(response.status_code, 0);
        assert_eq!(response.error, "connection refused");
    }

    #[test]
    fn test_client_starts_with_config_mock_mode() {
        let client = HttpClient::new(HttpConfig::default().with_mock_enabled(true));
        assert!(client.is_mock_enabled());
        client.set_mock_enabled(false);
        assert!(!client.is_mock_enabled());
        assert!(!HttpClient::with_defaults().is_mock_enabled());
    }

    #[test]
    fn test_shared_registry_between_clients() {
        let registry = Arc::new(MockRegistry::with_enabled(true));
        let first = HttpClient::with_mock_registry(HttpConfig::default(), Arc::clone(&registry));
        let second = HttpClient::with_mock_registry(HttpConfig::default(), registry);

        first.add_mock_response(
            Response {
                status_code: 201,
                ..Default::default()
            },
            "POST",
            "http://x/items",
        );
        assert_eq!(second.get_mock_response("POST", "http://x/items").status_code, 201);
    }

    #[tokio::test]
    async fn test_mock_mode_without_entry_returns_not_found() {
        let client = HttpClient::with_defaults();
        client.set_mock_enabled(true);

        let response = client
            .call(&Request::new("GET", "localhost:8080/api"))
            .await;
        assert_eq!(response, Response::not_found("GET", "localhost:8080/api"));
    }

    #[tokio::test]
    async fn test_mock_mode_returns_registered_response() {
        let client = HttpClient::with_defaults();
        client.set_mock_enabled(true);
        let stored = Response {
            method: "GET".to_string(),
            url: "http://x/y".to_string(),
            status_code: 200,
            body: "pong".to_string(),
            ..Default::default()
        };
        client.add_mock_response(stored.clone(), "GET", "http://x/y");

        assert_eq!(client.call(&Request::new("get", "http://x/y")).await, stored);
        assert_eq!(
            client.call(&Request::new("GET", "http://x/z")).await.status_code,
            404
        );
    }

    #[tokio::test]
    async fn test_malformed_url_yields_zero_status() {
        let client = HttpClient::with_defaults();
        let response = client.call(&Request::new("GET", "not a url")).await;

        assert_eq!(response.status_code, 0);
        assert!(response.body.is_empty());
        assert!(response.error.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_yields_zero_status() {
        let client = HttpClient::with_defaults();
        let request = Request::new("POST", "http://127.0.0.1:9/").set_body([("v", f64::NAN)]);
        let response = client.call(&request).await;

        assert_eq!(response.status_code, 0);
        assert!(response.error.is_empty());
    }
}
