//! Alpha Vantage REST client
//!
//! # Endpoint
//! - GET /query?function={mode}&symbol={ticker}&outputsize=compact&apikey={key}
//!
//! The service answers HTTP 200 for most failures and reports them in the
//! body, so every response goes through `parse_daily_response`.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::config::QuoteConfig;
use crate::error::DataSourceError;
use crate::series::parse_daily_response;
use crate::types::{QueryMode, Series};
use crate::ALPHA_VANTAGE_QUERY_PATH;

/// Latest ~100 closes
const OUTPUT_SIZE: &str = "compact";

/// Alpha Vantage REST client
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl QuoteClient {
    /// Create a client from config
    pub fn new(config: &QuoteConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url, api_key: config.api_key.clone() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /query for one daily mode, returning the raw JSON body
    pub async fn get_daily(&self, mode: QueryMode, symbol: &str) -> Result<Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, ALPHA_VANTAGE_QUERY_PATH);
        debug!("GET {} function={} symbol={}", url, mode.function(), symbol);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", mode.function()),
                ("symbol", symbol),
                ("outputsize", OUTPUT_SIZE),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            // The request URL carries the key
            .map_err(|e| DataSourceError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Network(status.to_string()));
        }

        response.json::<Value>().await.map_err(|e| {
            debug!("Failed to decode body for {}: {}", symbol, e.without_url());
            DataSourceError::UnexpectedShape
        })
    }

    /// Fetch and normalize one daily mode
    pub async fn fetch_daily(&self, mode: QueryMode, symbol: &str) -> Result<Series, DataSourceError> {
        let body = self.get_daily(mode, symbol).await?;
        parse_daily_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = QuoteClient::new(&QuoteConfig::new("demo"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_custom_base_url() {
        let config = QuoteConfig::new("demo").with_base_url("https://example.com/");
        let client = QuoteClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://example.com");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = QuoteConfig::new("demo").with_base_url("not a url");
        assert!(QuoteClient::new(&config).is_err());
    }
}
