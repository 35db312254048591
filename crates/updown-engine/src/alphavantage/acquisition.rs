//! Series acquisition with query mode fallback
//!
//! # Algorithm
//! 1. Try each `QueryMode` in order (adjusted first, raw second)
//! 2. The first mode that yields a series wins
//! 3. When every mode fails, surface the last mode's error
//!
//! No other retries happen here or above.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use super::client::QuoteClient;
use super::config::QuoteConfig;
use crate::error::DataSourceError;
use crate::series::SeriesSource;
use crate::types::{QueryMode, Series};

/// Daily series source backed by Alpha Vantage
#[derive(Clone)]
pub struct SeriesAcquisition {
    client: QuoteClient,
    modes: Vec<QueryMode>,
}

impl SeriesAcquisition {
    /// Adjusted-then-raw acquisition over an existing client
    pub fn new(client: QuoteClient) -> Self {
        Self { client, modes: QueryMode::ORDER.to_vec() }
    }

    pub fn from_config(config: &QuoteConfig) -> Result<Self> {
        Ok(Self::new(QuoteClient::new(config)?))
    }

    /// Override the mode order (e.g. raw only for free-tier keys)
    pub fn with_modes(mut self, modes: Vec<QueryMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn modes(&self) -> &[QueryMode] {
        &self.modes
    }
}

#[async_trait]
impl SeriesSource for SeriesAcquisition {
    async fn fetch(&self, ticker: &str) -> Result<Series, DataSourceError> {
        let mut last_err = DataSourceError::UnexpectedShape;

        for mode in &self.modes {
            match self.client.fetch_daily(*mode, ticker).await {
                Ok(series) => {
                    info!(
                        "Fetched {} closes for {} via {}",
                        series.len(),
                        ticker,
                        mode.function()
                    );
                    return Ok(series);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", mode.function(), ticker, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_order() {
        let acquisition = SeriesAcquisition::from_config(&QuoteConfig::new("demo")).unwrap();
        assert_eq!(acquisition.modes(), &[QueryMode::Primary, QueryMode::Fallback]);
    }

    #[tokio::test]
    async fn test_no_modes_is_unexpected_shape() {
        let acquisition = SeriesAcquisition::from_config(&QuoteConfig::new("demo"))
            .unwrap()
            .with_modes(Vec::new());
        assert_eq!(acquisition.fetch("IBM").await, Err(DataSourceError::UnexpectedShape));
    }
}
