//! Daily time-series payload normalization
//!
//! # Payload
//! ```json
//! {
//!   "Meta Data": { ... },
//!   "Time Series (Daily)": {
//!     "2024-01-02": { "4. close": "185.64", "5. adjusted close": "184.93", ... }
//!   }
//! }
//! ```
//! Instead of data the body may carry `Note` (rate limit), `Information`
//! or `Error Message`. These are checked in that order before the payload.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::DataSourceError;
use crate::types::{PricePoint, Series};

pub const FIELD_NOTE: &str = "Note";
pub const FIELD_INFORMATION: &str = "Information";
pub const FIELD_ERROR_MESSAGE: &str = "Error Message";
pub const FIELD_TIME_SERIES: &str = "Time Series (Daily)";
pub const FIELD_ADJUSTED_CLOSE: &str = "5. adjusted close";
pub const FIELD_CLOSE: &str = "4. close";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Anything that can produce a normalized daily series for a ticker
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, ticker: &str) -> Result<Series, DataSourceError>;
}

/// Classify a decoded response body and normalize its payload
pub fn parse_daily_response(body: &Value) -> Result<Series, DataSourceError> {
    let Some(obj) = body.as_object() else {
        return Err(DataSourceError::UnexpectedShape);
    };

    if let Some(note) = obj.get(FIELD_NOTE) {
        return Err(DataSourceError::RateLimited(message_text(note)));
    }
    if let Some(info) = obj.get(FIELD_INFORMATION) {
        return Err(DataSourceError::Unavailable(message_text(info)));
    }
    if obj.contains_key(FIELD_ERROR_MESSAGE) {
        return Err(DataSourceError::InvalidSymbol);
    }

    match obj.get(FIELD_TIME_SERIES).and_then(Value::as_object) {
        Some(payload) => Ok(build_sorted_series(payload)),
        None => Err(DataSourceError::UnexpectedShape),
    }
}

/// Build an ascending series from the `Time Series (Daily)` object.
///
/// Keys are ordered by calendar date, not by string. Rows whose key is not a
/// date or that carry no usable close are dropped.
pub fn build_sorted_series(payload: &Map<String, Value>) -> Series {
    let mut points = Vec::with_capacity(payload.len());

    for (key, row) in payload {
        let Ok(date) = NaiveDate::parse_from_str(key.trim(), DATE_FORMAT) else {
            warn!("Dropping row with unparseable date key: {}", key);
            continue;
        };

        match resolve_close(row) {
            Some(close) => points.push(PricePoint::new(date, close)),
            None => debug!("Dropping {}: no usable close", date),
        }
    }

    Series::from_points(points)
}

/// Adjusted close when usable, else raw close
fn resolve_close(row: &Value) -> Option<f64> {
    parse_price(row.get(FIELD_ADJUSTED_CLOSE)).or_else(|| parse_price(row.get(FIELD_CLOSE)))
}

/// Accepts string or numeric fields; only finite positive values count
fn parse_price(field: Option<&Value>) -> Option<f64> {
    let value = match field? {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_sorts_chronologically_across_year_boundary() {
        let raw = payload(json!({
            "2024-01-10": { "4. close": "3.00" },
            "2023-12-29": { "4. close": "1.00" },
            "2024-01-02": { "4. close": "2.00" }
        }));

        let series = build_sorted_series(&raw);
        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![date("2023-12-29"), date("2024-01-02"), date("2024-01-10")]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let raw = payload(json!({
            "2024-01-10": { "4. close": "3.00" },
            "2024-01-02": { "4. close": "2.00", "5. adjusted close": "1.90" },
            "2023-12-29": { "4. close": "1.00" }
        }));
        assert_eq!(build_sorted_series(&raw), build_sorted_series(&raw));
    }

    #[test]
    fn test_prefers_adjusted_close() {
        let raw = payload(json!({
            "2024-01-02": { "4. close": "200.00", "5. adjusted close": "100.00" },
            "2024-01-03": { "4. close": "201.00" },
            "2024-01-04": { "4. close": "202.00", "5. adjusted close": "" }
        }));

        let series = build_sorted_series(&raw);
        assert_eq!(series.close_on(date("2024-01-02")), Some(100.0));
        assert_eq!(series.close_on(date("2024-01-03")), Some(201.0));
        assert_eq!(series.close_on(date("2024-01-04")), Some(202.0));
    }

    #[test]
    fn test_drops_rows_without_close() {
        let raw = payload(json!({
            "2024-01-02": { "1. open": "10.00" },
            "2024-01-03": { "4. close": "11.00" },
            "not-a-date": { "4. close": "12.00" },
            "2024-01-04": { "4. close": "abc" }
        }));

        let series = build_sorted_series(&raw);
        assert_eq!(series.len(), 1);
        assert_eq!(series.dates().collect::<Vec<_>>(), vec![date("2024-01-03")]);
        assert_eq!(series.close_on(date("2024-01-02")), None);
    }

    #[test]
    fn test_classification_order() {
        let both = json!({ "Note": "slow down", "Information": "premium" });
        assert_eq!(
            parse_daily_response(&both),
            Err(DataSourceError::RateLimited("slow down".to_string()))
        );

        let info = json!({ "Information": "premium endpoint" });
        assert_eq!(
            parse_daily_response(&info),
            Err(DataSourceError::Unavailable("premium endpoint".to_string()))
        );

        let invalid = json!({ "Error Message": "Invalid API call" });
        assert_eq!(parse_daily_response(&invalid), Err(DataSourceError::InvalidSymbol));

        let shape = json!({ "Meta Data": {} });
        assert_eq!(parse_daily_response(&shape), Err(DataSourceError::UnexpectedShape));

        assert_eq!(parse_daily_response(&json!([1, 2])), Err(DataSourceError::UnexpectedShape));
    }

    #[test]
    fn test_parse_success() {
        let body = json!({
            "Meta Data": { "2. Symbol": "IBM" },
            "Time Series (Daily)": {
                "2024-01-03": { "4. close": "160.10" },
                "2024-01-02": { "4. close": "158.00" }
            }
        });
        let series = parse_daily_response(&body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, 158.0);
    }
}
