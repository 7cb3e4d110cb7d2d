//! HTTP client error types

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// A request that could not be turned into a transport request.
///
/// No network attempt is ever made for a request that fails with one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    /// Method is not a valid HTTP token
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// URL could not be parsed
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Header name or value is not representable on the wire
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Body map could not be serialized
    #[error("Body serialization failed: {0}")]
    Body(String),
}

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request was malformed
    #[error("Malformed request: {0}")]
    Request(#[from] RequestError),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<config::ConfigError> for HttpError {
    fn from(err: config::ConfigError) -> Self {
        HttpError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::Body(err.to_string())
    }
}
