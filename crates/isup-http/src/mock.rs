//! Canned responses keyed by method and URL

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::response::Response;

/// Registry of predetermined responses.
///
/// Keys are `method + "-" + url`, matched exactly. The method is not normalized here:
/// callers register with the same casing the request carries (uppercase for requests
/// built through [`crate::Request::new`]). Entries are never pruned automatically.
#[derive(Debug, Default)]
pub struct MockRegistry {
    enabled: AtomicBool,
    entries: RwLock<HashMap<String, Response>>,
}

impl MockRegistry {
    /// Create an empty, disabled registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with mock mode set to `enabled`
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `response` for `method` and `url`, replacing any previous entry
    pub fn add(&self, response: Response, method: &str, url: &str) {
        debug!("Registering mock response for {} {}", method, url);
        self.entries.write().insert(mock_key(method, url), response);
    }

    /// Stored response for `method` and `url`, or a 404 echoing both
    pub fn lookup(&self, method: &str, url: &str) -> Response {
        match self.entries.read().get(&mock_key(method, url)) {
            Some(response) => {
                debug!("Mock hit for {} {}", method, url);
                response.clone()
            }
            None => {
                debug!("Mock miss for {} {}", method, url);
                Response::not_found(method, url)
            }
        }
    }

    /// Drop the entry for `method` and `url`, returning it
    pub fn remove(&self, method: &str, url: &str) -> Option<Response> {
        self.entries.write().remove(&mock_key(method, url))
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Toggle whether calls are answered from this registry
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

// "A" + "-B" and "A-" + "B" share a key.
fn mock_key(method: &str, url: &str) -> String {
    format!("{method}-{url}")
}
