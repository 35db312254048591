//! Core types for the up/down game
//!
//! # Design Principles
//! 1. A `Series` can only be built sorted and deduplicated, so every date has a close
//! 2. Closes are resolved once at normalization and never re-read from the payload
//! 3. Game state is plain data; only `GameEngine` mutates it

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ParseDirectionError;

// ============================================================================
// Price Series
// ============================================================================

/// One trading day's close
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    /// Adjusted close when the source provided one, raw close otherwise
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closes in strictly ascending date order
///
/// Lookup by date is a binary search over the ordered points, so there is no
/// separate map that could drift out of sync with the date sequence.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Series {
    points: Vec<PricePoint>,
}

impl Series {
    /// Build a series from points in any order.
    ///
    /// Points without a finite positive close are dropped. When a date appears
    /// more than once the first occurrence wins.
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close.is_finite() && p.close > 0.0);
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Close price for a date, if the series contains it
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    /// Points in an inclusive index range, clamped to the series bounds
    pub fn window(&self, range: RangeInclusive<usize>) -> &[PricePoint] {
        if self.points.is_empty() {
            return &[];
        }
        let end = (*range.end()).min(self.points.len() - 1);
        let start = *range.start();
        if start > end {
            return &[];
        }
        &self.points[start..=end]
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

// ============================================================================
// Quote Source Protocol
// Source: https://www.alphavantage.co/documentation/
// ============================================================================

/// Query mode for the daily time-series request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Split/dividend adjusted series
    Primary,
    /// Raw daily series, used when the adjusted endpoint is degraded
    Fallback,
}

impl QueryMode {
    /// Ordered list of modes tried by the acquisition layer
    pub const ORDER: [QueryMode; 2] = [QueryMode::Primary, QueryMode::Fallback];

    /// Value of the `function` query parameter
    pub fn function(&self) -> &'static str {
        match self {
            QueryMode::Primary => "TIME_SERIES_DAILY_ADJUSTED",
            QueryMode::Fallback => "TIME_SERIES_DAILY",
        }
    }
}

// ============================================================================
// Predictions
// ============================================================================

/// Direction of a close-to-close move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Actual move from `base` to `next`.
    ///
    /// Only a strictly higher close is `Up`; an unchanged close scores as `Down`.
    pub fn between(base: f64, next: f64) -> Self {
        if next > base {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Past-tense verb used in feedback messages
    pub fn verb(&self) -> &'static str {
        match self {
            Direction::Up => "rose",
            Direction::Down => "fell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Result of one prediction, emitted to the feedback sink
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    pub predicted: Direction,
    pub actual: Direction,
    pub correct: bool,
    /// Index of the revealed point, which is also the new anchor
    pub revealed_index: usize,
    pub revealed_date: NaiveDate,
    pub revealed_close: f64,
}

/// Message severity for the info/feedback sink
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

// ============================================================================
// Game State
// ============================================================================

/// Engine phase
///
/// ```text
/// Idle -> Loading -> Active -> Ended
///           |
///           +-> Idle (failed start)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Idle,
    Loading,
    Active,
    Ended,
}

/// State of one game session, created fresh by every successful start
#[derive(Clone, Debug)]
pub struct GameState {
    pub series: Series,
    pub ticker: String,
    /// Baseline for the next prediction
    pub anchor_index: usize,
    /// Latest index shown to the player; equals `anchor_index` once set
    pub reveal_index: usize,
    pub score: u32,
    pub active: bool,
    /// Predictions evaluated this session
    pub predictions: u32,
}

impl GameState {
    pub(crate) fn new(ticker: String, series: Series, start_index: usize) -> Self {
        Self {
            series,
            ticker,
            anchor_index: start_index,
            reveal_index: start_index,
            score: 0,
            active: true,
            predictions: 0,
        }
    }

    /// Baseline point the next prediction is compared against
    pub fn anchor(&self) -> Option<&PricePoint> {
        self.series.get(self.anchor_index)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            ticker: self.ticker.clone(),
            score: self.score,
            predictions: self.predictions,
            accuracy: if self.predictions == 0 {
                None
            } else {
                Some(f64::from(self.score) / f64::from(self.predictions))
            },
        }
    }
}

/// End-of-session summary
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameSummary {
    pub ticker: String,
    pub score: u32,
    pub predictions: u32,
    /// Fraction of correct predictions, `None` before the first prediction
    pub accuracy: Option<f64>,
}
