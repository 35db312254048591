//! Date classification used to constrain game starts
//!
//! Pure functions; the current moment is passed in explicitly or read through
//! a [`Clock`] so tests can pin it.
//!
//! Weekends are the only non-trading days known here. Exchange holidays are
//! not modelled, so a holiday that somehow appears in a series is treated as
//! an ordinary weekday.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};

const SECS_PER_DAY: i64 = 86_400;

/// Source of the current moment
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock (UTC)
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Whole days between `now` and midnight UTC of `date`, rounded down.
///
/// Negative when `date` lies in the future of `now`.
pub fn days_ago(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    (now - midnight).num_seconds().div_euclid(SECS_PER_DAY)
}

/// True unless `date` is a Saturday or Sunday
pub fn is_trading_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_days_ago_counts_whole_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();
        assert_eq!(days_ago(date("2024-03-15"), now), 0);
        assert_eq!(days_ago(date("2024-03-14"), now), 1);
        assert_eq!(days_ago(date("2024-03-05"), now), 10);
    }

    #[test]
    fn test_days_ago_future_is_negative() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(days_ago(date("2024-03-16"), now), -1);
        assert_eq!(days_ago(date("2024-03-20"), now), -5);
    }

    #[test]
    fn test_days_ago_across_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(days_ago(date("2023-12-29"), now), 4);
    }

    #[test]
    fn test_weekday_classification() {
        // 2024-03-15 is a Friday
        assert!(is_trading_weekday(date("2024-03-15")));
        assert!(!is_trading_weekday(date("2024-03-16")));
        assert!(!is_trading_weekday(date("2024-03-17")));
        assert!(is_trading_weekday(date("2024-03-18")));
    }

    #[test]
    fn test_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(FixedClock(instant).now(), instant);
    }
}
