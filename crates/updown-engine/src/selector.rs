//! Start Selector - hidden start date selection
//!
//! # Eligibility
//! Index `i` with date `d` is eligible when all of these hold:
//! 1. `min_days_ago <= days_ago(d) <= max_days_ago`
//! 2. `i >= min_history` (enough earlier closes for the initial chart window)
//! 3. `i + min_future < len` (at least one close left to predict)
//! 4. `d` is a weekday
//!
//! One eligible index is drawn uniformly through a [`RandomSource`].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::calendar::{days_ago, is_trading_weekday};
use crate::types::Series;

/// Uniform draw over `0..count`
pub trait RandomSource: Send {
    /// Called only with `count > 0`
    fn uniform(&mut self, count: usize) -> usize;
}

/// Thread-local RNG, fresh handle per draw
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform(&mut self, count: usize) -> usize {
        rand::thread_rng().gen_range(0..count)
    }
}

/// Reproducible RNG for replays and tests
#[derive(Clone, Debug)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, count: usize) -> usize {
        self.0.gen_range(0..count)
    }
}

impl<F> RandomSource for F
where
    F: FnMut(usize) -> usize + Send,
{
    fn uniform(&mut self, count: usize) -> usize {
        self(count)
    }
}

/// Start selection bounds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Start date must be at least this many days old
    pub min_days_ago: i64,
    /// Start date must be at most this many days old
    pub max_days_ago: i64,
    /// Closes required before the start index
    pub min_history: usize,
    /// Closes required after the start index
    pub min_future: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_days_ago: 7,
            max_days_ago: 100,
            min_history: 7,
            min_future: 1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StartSelector {
    config: SelectorConfig,
}

impl StartSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Check a single index against all eligibility conditions
    pub fn is_eligible(&self, series: &Series, index: usize, now: DateTime<Utc>) -> bool {
        let Some(point) = series.get(index) else {
            return false;
        };
        let ago = days_ago(point.date, now);

        (self.config.min_days_ago..=self.config.max_days_ago).contains(&ago)
            && index >= self.config.min_history
            && index + self.config.min_future < series.len()
            && is_trading_weekday(point.date)
    }

    /// All eligible indices in ascending order
    pub fn eligible_indices(&self, series: &Series, now: DateTime<Utc>) -> Vec<usize> {
        (0..series.len()).filter(|&i| self.is_eligible(series, i, now)).collect()
    }

    /// Pick a random eligible index, `None` when nothing qualifies.
    ///
    /// Draws outside `0..count` from a custom source are clamped to the last
    /// eligible index.
    pub fn select_start(
        &self,
        series: &Series,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Option<usize> {
        let eligible = self.eligible_indices(series, now);
        debug!("Eligible start indices: {} of {}", eligible.len(), series.len());

        if eligible.is_empty() {
            return None;
        }

        let pick = rng.uniform(eligible.len()).min(eligible.len() - 1);
        Some(eligible[pick])
    }
}
