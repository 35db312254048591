//! Error taxonomy for acquisition and game start
//!
//! Display strings are the player-facing messages shown on the status line.

use thiserror::Error;

/// Failure of a single quote source attempt (or of the whole fallback chain)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Transport failure or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit / advisory note returned instead of data
    #[error("{0}")]
    RateLimited(String),

    /// Informational message returned instead of data
    #[error("{0}")]
    Unavailable(String),

    #[error("Invalid ticker symbol. Please try a different one.")]
    InvalidSymbol,

    #[error("Unexpected API response. Try again later.")]
    UnexpectedShape,
}

/// Discriminant of [`DataSourceError`] without the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSourceErrorKind {
    Network,
    RateLimited,
    Unavailable,
    InvalidSymbol,
    UnexpectedShape,
}

impl DataSourceError {
    pub fn kind(&self) -> DataSourceErrorKind {
        match self {
            DataSourceError::Network(_) => DataSourceErrorKind::Network,
            DataSourceError::RateLimited(_) => DataSourceErrorKind::RateLimited,
            DataSourceError::Unavailable(_) => DataSourceErrorKind::Unavailable,
            DataSourceError::InvalidSymbol => DataSourceErrorKind::InvalidSymbol,
            DataSourceError::UnexpectedShape => DataSourceErrorKind::UnexpectedShape,
        }
    }
}

/// Failure of `GameEngine::start`; the engine is back in `Idle` afterwards
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Please enter a stock ticker.")]
    InvalidInput,

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("Insufficient data to select a valid start date. Try another ticker.")]
    InsufficientData,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown direction '{0}', expected up or down")]
pub struct ParseDirectionError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message_is_verbatim() {
        let err = DataSourceError::RateLimited("Thank you for using Alpha Vantage!".to_string());
        assert_eq!(err.to_string(), "Thank you for using Alpha Vantage!");
        assert_eq!(err.kind(), DataSourceErrorKind::RateLimited);
    }

    #[test]
    fn test_game_error_wraps_source_message() {
        let err: GameError = DataSourceError::Network("503 Service Unavailable".to_string()).into();
        assert_eq!(err.to_string(), "Network error: 503 Service Unavailable");
    }
}
