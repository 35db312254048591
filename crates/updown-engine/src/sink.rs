//! Outbound interfaces for the chart and the info/feedback panel
//!
//! The engine never renders anything itself. Front ends implement these
//! traits; [`RecordingSink`] keeps every call in memory.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::types::{PricePoint, Severity};

/// Price chart
pub trait ChartSink: Send {
    /// Replace the chart with a new series
    fn init_series(&mut self, ticker: &str, points: &[PricePoint]);

    /// Append one revealed point
    fn append_point(&mut self, date: NaiveDate, close: f64);

    /// Remove the chart
    fn reset(&mut self);
}

/// Status line, feedback line, score and baseline quote
pub trait InfoSink: Send {
    fn set_status(&mut self, message: &str, severity: Severity);

    fn set_feedback(&mut self, message: &str, severity: Severity);

    fn set_score(&mut self, score: u32);

    /// Baseline the next prediction is compared against
    fn set_quote(&mut self, ticker: &str, date: NaiveDate, close: f64);

    /// Clear ticker/date/price and feedback, zero the score
    fn reset(&mut self);
}

/// One recorded sink call
#[derive(Clone, Debug, PartialEq)]
pub enum SinkEvent {
    InitSeries { ticker: String, points: Vec<PricePoint> },
    AppendPoint(PricePoint),
    ResetChart,
    Status { message: String, severity: Severity },
    Feedback { message: String, severity: Severity },
    Score(u32),
    Quote { ticker: String, point: PricePoint },
    ResetInfo,
}

/// In-memory sink; clones share the same event log
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SinkEvent>> {
        // A poisoned log is still readable
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, event: SinkEvent) {
        self.lock().push(event);
    }

    /// Points currently on the chart, replaying init/append/reset
    pub fn chart_points(&self) -> Vec<PricePoint> {
        let mut points = Vec::new();
        for event in self.lock().iter() {
            match event {
                SinkEvent::InitSeries { points: init, .. } => points = init.clone(),
                SinkEvent::AppendPoint(p) => points.push(*p),
                SinkEvent::ResetChart => points.clear(),
                _ => {}
            }
        }
        points
    }

    pub fn last_status(&self) -> Option<(String, Severity)> {
        self.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Status { message, severity } => Some((message.clone(), *severity)),
            _ => None,
        })
    }

    pub fn last_feedback(&self) -> Option<(String, Severity)> {
        self.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Feedback { message, severity } => Some((message.clone(), *severity)),
            _ => None,
        })
    }

    /// Score shown after replaying score updates and resets
    pub fn score(&self) -> u32 {
        let mut score = 0;
        for event in self.lock().iter() {
            match event {
                SinkEvent::Score(s) => score = *s,
                SinkEvent::ResetInfo => score = 0,
                _ => {}
            }
        }
        score
    }

    pub fn last_quote(&self) -> Option<(String, PricePoint)> {
        self.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Quote { ticker, point } => Some((ticker.clone(), *point)),
            _ => None,
        })
    }
}

impl ChartSink for RecordingSink {
    fn init_series(&mut self, ticker: &str, points: &[PricePoint]) {
        self.push(SinkEvent::InitSeries { ticker: ticker.to_string(), points: points.to_vec() });
    }

    fn append_point(&mut self, date: NaiveDate, close: f64) {
        self.push(SinkEvent::AppendPoint(PricePoint::new(date, close)));
    }

    fn reset(&mut self) {
        self.push(SinkEvent::ResetChart);
    }
}

impl InfoSink for RecordingSink {
    fn set_status(&mut self, message: &str, severity: Severity) {
        self.push(SinkEvent::Status { message: message.to_string(), severity });
    }

    fn set_feedback(&mut self, message: &str, severity: Severity) {
        self.push(SinkEvent::Feedback { message: message.to_string(), severity });
    }

    fn set_score(&mut self, score: u32) {
        self.push(SinkEvent::Score(score));
    }

    fn set_quote(&mut self, ticker: &str, date: NaiveDate, close: f64) {
        self.push(SinkEvent::Quote { ticker: ticker.to_string(), point: PricePoint::new(date, close) });
    }

    fn reset(&mut self) {
        self.push(SinkEvent::ResetInfo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_clones_share_log() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        InfoSink::set_score(&mut writer, 3);
        assert_eq!(sink.score(), 3);
    }

    #[test]
    fn test_chart_replay() {
        let mut sink = RecordingSink::new();
        let a = PricePoint::new(date("2024-01-02"), 1.0);
        sink.init_series("IBM", &[a]);
        sink.append_point(date("2024-01-03"), 2.0);
        assert_eq!(sink.chart_points().len(), 2);

        ChartSink::reset(&mut sink);
        assert!(sink.chart_points().is_empty());
    }

    #[test]
    fn test_info_reset_zeroes_score() {
        let mut sink = RecordingSink::new();
        sink.set_score(5);
        InfoSink::reset(&mut sink);
        assert_eq!(sink.score(), 0);
    }
}
