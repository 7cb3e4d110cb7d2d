//! HTTP client facade with normalized responses
//!
//! Builds outbound requests from chained setters, executes them with a per-request
//! timeout and certificate policy, and folds every outcome into a single [`Response`]
//! value. A [`MockRegistry`] can answer calls instead of the network.
//!
//! ## Features
//!
//! - **Value-style builder**: each `set_*` consumes and returns the [`Request`]
//! - **Bounded calls**: one attempt, timeout clamped to 50..=60000 ms
//! - **Failure taxonomy**: synthetic status codes for timeouts and certificate errors
//! - **Mock mode**: canned responses keyed by method and URL
//! - **Trait-based design**: substitute the client via [`HttpCaller`]
//!
//! ```no_run
//! use isup_http::{HttpCaller, HttpClient, Request};
//!
//! # async fn probe() {
//! let client = HttpClient::with_defaults();
//! let request = Request::new("get", "https://example.com/health")
//!     .set_accept("application/json")
//!     .set_timeout(500);
//!
//! let response = client.call(&request).await;
//! println!("{} in {}ms", response.status_code, response.response_time_ms);
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod request;
pub mod response;
pub mod status;
pub mod value;

pub use client::{shared_client, HttpCaller, HttpClient};
pub use config::HttpConfig;
pub use error::{HttpError, RequestError, Result};
pub use mock::MockRegistry;
pub use request::{
    create_request, RenderedRequest, Request, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS,
};
pub use response::Response;
pub use status::{status_text, SyntheticStatus, STATUS_INVALID_CERTIFICATE, STATUS_TIMEOUT};
pub use value::Value;
