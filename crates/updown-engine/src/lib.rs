//! Up/Down Game Engine
//!
//! A single-player prediction game over historical daily closes:
//! - `alphavantage`: HTTP acquisition with adjusted -> raw query fallback
//! - `series`: normalization of the raw time-series payload
//! - `calendar` / `selector`: hidden start date selection
//! - `engine`: reveal/prediction state machine and scoring
//! - `sink`: outbound chart and info/feedback interfaces
//!
//! # Official Documentation
//! - Daily Adjusted: https://www.alphavantage.co/documentation/#dailyadj
//! - Daily: https://www.alphavantage.co/documentation/#daily

pub mod calendar;
pub mod engine;
pub mod error;
pub mod selector;
pub mod series;
pub mod sink;
pub mod types;

#[cfg(feature = "http")]
pub mod alphavantage;

pub use engine::{GameEngine, StartTicket};
pub use error::{DataSourceError, DataSourceErrorKind, GameError};
pub use series::{build_sorted_series, SeriesSource};
pub use types::*;

/// Official Alpha Vantage API base URL
/// Source: https://www.alphavantage.co/documentation/
pub const ALPHA_VANTAGE_API_BASE: &str = "https://www.alphavantage.co";

/// Query path shared by every Alpha Vantage function
pub const ALPHA_VANTAGE_QUERY_PATH: &str = "/query";
