//! HTTP client configuration

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix for environment overrides, e.g. `ISUP_HTTP_MOCK_ENABLED=true`
pub const ENV_PREFIX: &str = "ISUP_HTTP";

/// HTTP client configuration.
///
/// Timeout and certificate policy are per request and live on [`crate::Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User agent sent on every network call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether a client built from this config starts in mock mode
    #[serde(default)]
    pub mock_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            mock_enabled: false,
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from an optional TOML file, then `ISUP_HTTP_*` environment variables.
    ///
    /// A missing file is not an error; unset keys fall back to their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Start clients in mock mode
    pub fn with_mock_enabled(mut self, enabled: bool) -> Self {
        self.mock_enabled = enabled;
        self
    }
}

fn default_user_agent() -> String {
    format!("isup-http/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert!(config.user_agent.starts_with("isup-http/"));
        assert!(!config.mock_enabled);
    }

    #[test]
    fn test_builder_pattern() {
        let config = HttpConfig::new()
            .with_user_agent("probe/1.0")
            .with_mock_enabled(true);

        assert_eq!(config.user_agent, "probe/1.0");
        assert!(config.mock_enabled);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "user_agent = \"monitor/2.0\"").unwrap();
        writeln!(file, "mock_enabled = true").unwrap();

        let config = HttpConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.user_agent, "monitor/2.0");
        assert!(config.mock_enabled);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "mock_enabled = true").unwrap();

        let config = HttpConfig::load(Some(file.path())).unwrap();
        assert!(config.mock_enabled);
        assert_eq!(config.user_agent, default_user_agent());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HttpConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config, HttpConfig::default());
    }

    #[test]
    fn test_load_rejects_malformed_value() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "mock_enabled = \"sometimes\"").unwrap();

        assert!(HttpConfig::load(Some(file.path())).is_err());
    }
}
