//! Configuration for the Alpha Vantage quote source
//!
//! The API key is opaque configuration: read from the environment or passed
//! in by the caller, never compiled in.

use std::time::Duration;

use crate::ALPHA_VANTAGE_API_BASE;

/// Env var holding the API key
pub const ENV_API_KEY: &str = "ALPHAVANTAGE_API_KEY";

/// Env var overriding the base URL
pub const ENV_BASE_URL: &str = "ALPHAVANTAGE_BASE_URL";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct QuoteConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl QuoteConfig {
    /// Config for the official endpoint with the default timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ALPHA_VANTAGE_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create config from environment variables
    ///
    /// Expected env vars:
    /// - ALPHAVANTAGE_API_KEY (required)
    /// - ALPHAVANTAGE_BASE_URL (optional)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(ENV_API_KEY).ok()?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        Some(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that key and base URL are present (non-empty)
    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.base_url.trim().is_empty()
    }
}

impl std::fmt::Debug for QuoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteConfig")
            .field("api_key", &format!("{}...", &self.api_key.chars().take(4).collect::<String>()))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_redacts_key() {
        let config = QuoteConfig::new("ABCDEFGHIJKLMNOP");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("ABCDEFGHIJKLMNOP"));
        assert!(debug_str.contains("ABCD..."));
    }

    #[test]
    fn test_config_defaults() {
        let config = QuoteConfig::new("key");
        assert_eq!(config.base_url, ALPHA_VANTAGE_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_validity() {
        assert!(QuoteConfig::new("key").is_valid());
        assert!(!QuoteConfig::new("  ").is_valid());
        assert!(!QuoteConfig::new("key").with_base_url("").is_valid());
    }
}
