//! Game Engine - reveal/prediction state machine
//!
//! # State Machine
//! Idle -> Loading (ticker accepted, fetch in flight)
//! Loading -> Active (series fetched and a start date selected)
//! Loading -> Idle (fetch failed or no eligible start date)
//! Active -> Active (prediction evaluated, one more close revealed)
//! Active -> Ended (data exhausted or explicit end)
//!
//! # Indices
//! `anchor_index` is the baseline for the next prediction and `reveal_index`
//! the latest close shown. Both point at the same close whenever a game is
//! active: the baseline price is visible, only the following move is hidden.
//!
//! # Re-entrant start
//! A newer start replaces an in-flight one. Every `begin_start` bumps a
//! generation counter and `complete_start` drops results for older tickets.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::calendar::{Clock, SystemClock};
use crate::error::{DataSourceError, GameError};
use crate::selector::{RandomSource, StartSelector, ThreadRandom};
use crate::series::SeriesSource;
use crate::sink::{ChartSink, InfoSink};
use crate::types::{Direction, GamePhase, GameState, GameSummary, Outcome, Series, Severity};

const MSG_FETCHING: &str = "Fetching data…";
const MSG_NO_MORE_DATA: &str = "No more future data available. Ending game.";
const MSG_GAME_ENDED: &str = "Game ended. You can enter a ticker to start again.";

/// Handle for a start whose fetch is in flight
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartTicket {
    generation: u64,
    ticker: String,
}

impl StartTicket {
    /// Normalized (trimmed, uppercase) ticker
    pub fn ticker(&self) -> &str {
        &self.ticker
    }
}

/// Owns the single live game session
pub struct GameEngine {
    source: Arc<dyn SeriesSource>,
    selector: StartSelector,
    rng: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
    chart: Box<dyn ChartSink>,
    info: Box<dyn InfoSink>,

    // State
    phase: GamePhase,
    state: Option<GameState>,
    generation: u64,
}

impl GameEngine {
    /// Create an idle engine with the thread RNG and the system clock
    pub fn new(
        source: Arc<dyn SeriesSource>,
        chart: impl ChartSink + 'static,
        info: impl InfoSink + 'static,
    ) -> Self {
        Self {
            source,
            selector: StartSelector::new(),
            rng: Box::new(ThreadRandom),
            clock: Box::new(SystemClock),
            chart: Box::new(chart),
            info: Box::new(info),
            phase: GamePhase::Idle,
            state: None,
            generation: 0,
        }
    }

    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Active
    }

    /// Current or most recently finished session
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn summary(&self) -> Option<GameSummary> {
        self.state.as_ref().map(GameState::summary)
    }

    /// Shared handle to the series source, for driving a split start
    pub fn source(&self) -> Arc<dyn SeriesSource> {
        Arc::clone(&self.source)
    }

    /// Start a new game: fetch, select the hidden start, reveal the window.
    ///
    /// Any failure leaves the engine `Idle` with no session.
    pub async fn start(&mut self, ticker_raw: &str) -> Result<(), GameError> {
        let ticket = self.begin_start(ticker_raw)?;
        let source = self.source();
        let result = source.fetch(ticket.ticker()).await;
        self.complete_start(ticket, result)?;
        Ok(())
    }

    /// First half of `start`: validate the ticker and enter `Loading`.
    ///
    /// Clears the previous session and supersedes any start still in flight.
    pub fn begin_start(&mut self, ticker_raw: &str) -> Result<StartTicket, GameError> {
        self.reset_session();
        self.generation += 1;

        let ticker = ticker_raw.trim().to_uppercase();
        if ticker.is_empty() {
            self.phase = GamePhase::Idle;
            self.info.set_status(&GameError::InvalidInput.to_string(), Severity::Error);
            return Err(GameError::InvalidInput);
        }

        info!("Starting game for {} (generation {})", ticker, self.generation);
        self.phase = GamePhase::Loading;
        self.info.set_status(MSG_FETCHING, Severity::Info);

        Ok(StartTicket { generation: self.generation, ticker })
    }

    /// Second half of `start`: apply the fetch result for a ticket.
    ///
    /// Returns `Ok(false)` without touching anything when the ticket was
    /// superseded by a newer `begin_start`.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        fetched: Result<Series, DataSourceError>,
    ) -> Result<bool, GameError> {
        if ticket.generation != self.generation || self.phase != GamePhase::Loading {
            debug!(
                "Discarding stale start for {} (generation {}, current {})",
                ticket.ticker, ticket.generation, self.generation
            );
            return Ok(false);
        }

        let series = match fetched {
            Ok(series) => series,
            Err(e) => return Err(self.fail_start(&ticket.ticker, e.into())),
        };

        let now = self.clock.now();
        let Some(start) = self.selector.select_start(&series, now, self.rng.as_mut()) else {
            return Err(self.fail_start(&ticket.ticker, GameError::InsufficientData));
        };

        let history = self.selector.config().min_history;
        let window = series.window(start.saturating_sub(history)..=start);
        self.chart.init_series(&ticket.ticker, window);

        let state = GameState::new(ticket.ticker, series, start);
        if let Some(anchor) = state.anchor() {
            info!(
                "Game started for {}: {} closes, hidden start #{} ({})",
                state.ticker,
                state.series.len(),
                start,
                anchor.date
            );
            self.info.set_quote(&state.ticker, anchor.date, anchor.close);
            self.info.set_score(0);
            self.info.set_status(
                &format!(
                    "Game started. Random start date selected. Make your first prediction for the day after {}.",
                    anchor.date
                ),
                Severity::Info,
            );
        }

        self.state = Some(state);
        self.phase = GamePhase::Active;
        Ok(true)
    }

    /// Predict the next close's direction relative to the anchor.
    ///
    /// Returns `None` when no game is active, or when the data ran out, in
    /// which case the game moves to `Ended`.
    pub fn predict(&mut self, direction: Direction) -> Option<Outcome> {
        if self.phase != GamePhase::Active {
            debug!("Ignoring prediction in phase {:?}", self.phase);
            return None;
        }
        let state = self.state.as_mut()?;

        let next = state.anchor_index + 1;
        let (Some(base), Some(revealed)) =
            (state.series.get(state.anchor_index).copied(), state.series.get(next).copied())
        else {
            self.info.set_feedback(MSG_NO_MORE_DATA, Severity::Error);
            state.active = false;
            self.phase = GamePhase::Ended;
            info!(
                "Game over for {}: data exhausted, score {}/{}",
                state.ticker, state.score, state.predictions
            );
            return None;
        };

        let actual = Direction::between(base.close, revealed.close);
        let correct = direction == actual;
        state.predictions += 1;
        if correct {
            state.score += 1;
        }

        let message = format!(
            "{} {} {} to ${:.2} on {}.",
            if correct { "Correct!" } else { "Wrong." },
            state.ticker,
            actual.verb(),
            revealed.close,
            revealed.date
        );
        let severity = if correct { Severity::Success } else { Severity::Error };
        self.info.set_feedback(&message, severity);
        self.info.set_score(state.score);

        self.chart.append_point(revealed.date, revealed.close);
        state.reveal_index = next;
        state.anchor_index = next;
        self.info.set_quote(&state.ticker, revealed.date, revealed.close);

        debug!(
            "Prediction {} vs actual {} on {}: score {}/{}",
            direction, actual, revealed.date, state.score, state.predictions
        );

        Some(Outcome {
            predicted: direction,
            actual,
            correct,
            revealed_index: next,
            revealed_date: revealed.date,
            revealed_close: revealed.close,
        })
    }

    /// End the active game. The chart and score stay visible.
    pub fn end(&mut self) -> Option<GameSummary> {
        if self.phase != GamePhase::Active {
            debug!("Ignoring end in phase {:?}", self.phase);
            return None;
        }
        let state = self.state.as_mut()?;

        state.active = false;
        self.phase = GamePhase::Ended;
        self.info.set_feedback(MSG_GAME_ENDED, Severity::Info);

        let summary = state.summary();
        info!(
            "Game ended for {}: score {}/{}",
            summary.ticker, summary.score, summary.predictions
        );
        Some(summary)
    }

    /// Format status line for observability
    pub fn status_line(&self) -> String {
        let phase = format!("{:?}", self.phase);
        match &self.state {
            Some(s) => {
                let date = s
                    .anchor()
                    .map(|p| p.date.to_string())
                    .unwrap_or_else(|| "None".to_string());
                format!(
                    "phase={} ticker={} anchor={}({}) reveal={} score={}/{}",
                    phase, s.ticker, s.anchor_index, date, s.reveal_index, s.score, s.predictions
                )
            }
            None => format!("phase={} ticker=None", phase),
        }
    }

    fn reset_session(&mut self) {
        self.state = None;
        self.chart.reset();
        self.info.reset();
    }

    fn fail_start(&mut self, ticker: &str, err: GameError) -> GameError {
        warn!("Start failed for {}: {}", ticker, err);
        self.reset_session();
        self.phase = GamePhase::Idle;
        self.info.set_status(&err.to_string(), Severity::Error);
        err
    }
}
