//! Alpha Vantage daily series acquisition
//!
//! # Components
//! - `QuoteConfig`: API key, base URL and request timeout
//! - `QuoteClient`: one daily time-series request, classified into a `Series` or `DataSourceError`
//! - `SeriesAcquisition`: ordered query modes (adjusted, then raw) behind `SeriesSource`
//!
//! # Source
//! - https://www.alphavantage.co/documentation/#time-series-data

mod client;
pub mod acquisition;
pub mod config;

pub use acquisition::SeriesAcquisition;
pub use client::QuoteClient;
pub use config::QuoteConfig;
