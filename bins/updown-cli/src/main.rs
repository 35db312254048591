//! Up/Down terminal game
//!
//! Commands:
//! - `play`: interactive game on stdin/stdout
//! - `fetch`: download and normalize a daily series, print it as JSON
//!
//! # Usage
//! ```bash
//! # Requires an API key
//! ALPHAVANTAGE_API_KEY=... updown play --ticker AAPL
//!
//! # Reproducible start date
//! updown play --ticker MSFT --seed 42
//!
//! # Inspect the normalized series
//! updown fetch --ticker IBM --out data/ibm.json
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{error, info, warn};

use updown_engine::alphavantage::config::{DEFAULT_TIMEOUT_SECS, ENV_API_KEY};
use updown_engine::alphavantage::{QuoteConfig, SeriesAcquisition};
use updown_engine::selector::SeededRandom;
use updown_engine::sink::{ChartSink, InfoSink};
use updown_engine::{
    DataSourceError, Direction, GameEngine, GamePhase, GameSummary, PricePoint, QueryMode,
    SeriesSource, Severity,
};

#[derive(Parser)]
#[command(name = "updown")]
#[command(about = "Guess whether the next daily close went up or down")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Alpha Vantage API key (default: ALPHAVANTAGE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively
    Play {
        /// Ticker to start with (otherwise use `new <TICKER>` at the prompt)
        #[arg(long)]
        ticker: Option<String>,

        /// Seed for the hidden start date
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Fetch and normalize a daily series
    Fetch {
        /// Ticker symbol
        #[arg(long)]
        ticker: String,

        /// Output file for the series JSON (optional, defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Skip the adjusted series and query raw closes only
        #[arg(long, default_value = "false")]
        raw_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Play { ticker, seed } => run_play(config, ticker, seed).await,
        Commands::Fetch { ticker, out, raw_only } => run_fetch(config, ticker, out, raw_only).await,
    }
}

fn load_config(cli: &Cli) -> Result<QuoteConfig> {
    let mut config = match (cli.api_key.clone(), QuoteConfig::from_env()) {
        (Some(api_key), Some(env)) => QuoteConfig { api_key, ..env },
        (Some(api_key), None) => QuoteConfig::new(api_key),
        (None, Some(env)) => env,
        (None, None) => {
            error!("Missing API key. Pass --api-key or set {}", ENV_API_KEY);
            anyhow::bail!("Missing API key");
        }
    };

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    config = config.with_timeout(Duration::from_secs(cli.timeout_secs));

    if !config.is_valid() {
        anyhow::bail!("Invalid configuration: {:?}", config);
    }

    info!("Config: {:?}", config);
    Ok(config)
}

// ============================================================================
// Terminal sinks
// ============================================================================

/// Plain text rendering of chart and info updates
#[derive(Clone, Copy, Default)]
struct Terminal;

impl ChartSink for Terminal {
    fn init_series(&mut self, ticker: &str, points: &[PricePoint]) {
        println!();
        println!("{} close prices", ticker);
        for p in points {
            println!("  {}  {:>10.2}", p.date, p.close);
        }
    }

    fn append_point(&mut self, date: NaiveDate, close: f64) {
        println!("  {}  {:>10.2}  (revealed)", date, close);
    }

    fn reset(&mut self) {}
}

impl InfoSink for Terminal {
    fn set_status(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => println!("[error] {}", message),
            _ => println!("{}", message),
        }
    }

    fn set_feedback(&mut self, message: &str, severity: Severity) {
        let tag = match severity {
            Severity::Success => "[hit]",
            Severity::Error => "[miss]",
            Severity::Info => "[info]",
        };
        println!("{} {}", tag, message);
    }

    fn set_score(&mut self, score: u32) {
        println!("Score: {}", score);
    }

    fn set_quote(&mut self, ticker: &str, date: NaiveDate, close: f64) {
        println!("Baseline: {} {} ${:.2}", ticker, date, close);
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Interactive play
// ============================================================================

enum Command {
    Predict(Direction),
    End,
    New(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_lowercase().as_str() {
        "new" | "start" | "t" => Command::New(rest.to_string()),
        "end" | "e" => Command::End,
        "status" | "s" => Command::Status,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => match other.parse::<Direction>() {
            Ok(direction) => Command::Predict(direction),
            Err(_) => Command::Unknown(line.to_string()),
        },
    }
}

fn print_help() {
    println!("Commands:");
    println!("  new <TICKER>   start a game (replaces a game or a pending load)");
    println!("  up | u         next close is higher");
    println!("  down | d       next close is lower or unchanged");
    println!("  end            end the current game");
    println!("  status         show engine state");
    println!("  quit           exit");
}

fn print_summary(summary: &GameSummary) {
    let accuracy = summary
        .accuracy
        .map(|a| format!("{:.0}%", a * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "{}: {} correct of {} predictions ({})",
        summary.ticker, summary.score, summary.predictions, accuracy
    );
}

fn prompt() {
    print!("> ");
    std::io::stdout().flush().ok();
}

async fn run_play(config: QuoteConfig, ticker: Option<String>, seed: Option<u64>) -> Result<()> {
    let timeout = config.timeout;
    let source = SeriesAcquisition::from_config(&config)?;
    let mut engine = GameEngine::new(std::sync::Arc::new(source), Terminal, Terminal);
    if let Some(seed) = seed {
        engine = engine.with_random(SeededRandom::new(seed));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    if let Some(ticker) = ticker {
        if run_start(&mut engine, ticker, &mut lines, timeout).await? {
            return Ok(());
        }
    }

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            Command::Predict(direction) => {
                if engine.predict(direction).is_none() {
                    match engine.phase() {
                        GamePhase::Ended => {
                            if let Some(summary) = engine.summary() {
                                print_summary(&summary);
                            }
                        }
                        _ => println!("No active game. Type `new <TICKER>`."),
                    }
                }
            }
            Command::End => match engine.end() {
                Some(summary) => print_summary(&summary),
                None => println!("No active game."),
            },
            Command::New(ticker) => {
                if run_start(&mut engine, ticker, &mut lines, timeout).await? {
                    break;
                }
            }
            Command::Status => println!("{}", engine.status_line()),
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(s) if s.is_empty() => {}
            Command::Unknown(s) => println!("Unknown command: {} (type `help`)", s),
        }
    }

    if engine.is_active() {
        if let Some(summary) = engine.end() {
            print_summary(&summary);
        }
    }
    Ok(())
}

/// Effect of a line typed while a start is loading
#[derive(Debug, PartialEq)]
enum WhileLoading {
    Replace(String),
    Quit,
    Ignore,
}

fn while_loading(line: &str) -> WhileLoading {
    match parse_command(line) {
        Command::New(ticker) => WhileLoading::Replace(ticker),
        Command::Quit => WhileLoading::Quit,
        _ => WhileLoading::Ignore,
    }
}

/// Start a game, letting the player replace the ticker while the fetch is
/// in flight. Returns `true` when the player asked to quit.
async fn run_start<R: AsyncBufRead + Unpin>(
    engine: &mut GameEngine,
    ticker: String,
    lines: &mut Lines<R>,
    timeout: Duration,
) -> Result<bool> {
    let mut next = Some(ticker);

    while let Some(ticker) = next.take() {
        // Empty tickers are reported on the status line by the engine
        let Ok(ticket) = engine.begin_start(&ticker) else {
            return Ok(false);
        };

        let symbol = ticket.ticker().to_string();
        let source = engine.source();
        let fetch = tokio::time::timeout(timeout, source.fetch(&symbol));
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                biased;

                fetched = &mut fetch => {
                    let fetched = fetched.unwrap_or_else(|_| {
                        Err(DataSourceError::Network(format!("timed out after {}s", timeout.as_secs())))
                    });
                    // Failures are already on the status line
                    if let Err(e) = engine.complete_start(ticket, fetched) {
                        warn!("Start for {} failed: {}", symbol, e);
                    }
                    break;
                }
                _ = tokio::signal::ctrl_c() => return Ok(true),
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(true);
                    };
                    match while_loading(&line) {
                        WhileLoading::Replace(replacement) => {
                            info!("Replacing pending start for {} with {}", symbol, replacement);
                            next = Some(replacement);
                            break;
                        }
                        WhileLoading::Quit => return Ok(true),
                        WhileLoading::Ignore => println!("Still loading {}…", symbol),
                    }
                }
            }
        }
    }

    Ok(false)
}

// ============================================================================
// Fetch
// ============================================================================

async fn run_fetch(
    config: QuoteConfig,
    ticker: String,
    out: Option<PathBuf>,
    raw_only: bool,
) -> Result<()> {
    info!("=== Series Fetch ===");
    info!("Base URL: {}", config.base_url);
    info!("Ticker: {}", ticker);

    let mut acquisition = SeriesAcquisition::from_config(&config)?;
    if raw_only {
        acquisition = acquisition.with_modes(vec![QueryMode::Fallback]);
    }

    let symbol = ticker.trim().to_uppercase();
    let series = match acquisition.fetch(&symbol).await {
        Ok(series) => series,
        Err(e) => {
            error!("Fetch failed for {}: {}", symbol, e);
            anyhow::bail!("Fetch failed: {}", e);
        }
    };

    info!(
        "Fetched {} closes ({} to {})",
        series.len(),
        series.first().map(|p| p.date.to_string()).unwrap_or_default(),
        series.last().map(|p| p.date.to_string()).unwrap_or_default()
    );

    let json_output = serde_json::to_string_pretty(&serde_json::json!({
        "ticker": symbol,
        "count": series.len(),
        "series": series,
    }))?;

    // Write to file or stdout
    if let Some(out_path) = out {
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&out_path, &json_output).await?;
        info!("Output written to: {}", out_path.display());
    } else {
        println!("{}", json_output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use updown_engine::sink::RecordingSink;
    use updown_engine::Series;

    /// Never answers for AAPL, rejects everything else
    #[derive(Default)]
    struct HangingSource {
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SeriesSource for HangingSource {
        async fn fetch(&self, ticker: &str) -> Result<Series, DataSourceError> {
            self.requested.lock().unwrap().push(ticker.to_string());
            if ticker == "AAPL" {
                std::future::pending::<()>().await;
            }
            Err(DataSourceError::InvalidSymbol)
        }
    }

    fn loading_engine() -> (Arc<HangingSource>, RecordingSink, GameEngine) {
        let source = Arc::new(HangingSource::default());
        let sink = RecordingSink::new();
        let engine = GameEngine::new(source.clone(), sink.clone(), sink.clone());
        (source, sink, engine)
    }

    #[test]
    fn test_while_loading() {
        assert_eq!(while_loading("new msft"), WhileLoading::Replace("msft".to_string()));
        assert_eq!(while_loading("quit"), WhileLoading::Quit);
        assert_eq!(while_loading("up"), WhileLoading::Ignore);
        assert_eq!(while_loading("end"), WhileLoading::Ignore);
    }

    #[tokio::test]
    async fn test_new_ticker_replaces_pending_start() {
        let (source, sink, mut engine) = loading_engine();
        let mut lines = BufReader::new(&b"up\nnew msft\n"[..]).lines();

        let quit = run_start(&mut engine, "aapl".to_string(), &mut lines, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!quit);
        assert_eq!(*source.requested.lock().unwrap(), vec!["AAPL", "MSFT"]);
        assert_eq!(engine.phase(), GamePhase::Idle);
        assert_eq!(
            sink.last_status(),
            Some(("Invalid ticker symbol. Please try a different one.".to_string(), Severity::Error))
        );
    }

    #[tokio::test]
    async fn test_quit_while_loading() {
        let (source, _sink, mut engine) = loading_engine();
        let mut lines = BufReader::new(&b"q\n"[..]).lines();

        let quit = run_start(&mut engine, "AAPL".to_string(), &mut lines, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(quit);
        assert_eq!(*source.requested.lock().unwrap(), vec!["AAPL"]);
        assert_eq!(engine.phase(), GamePhase::Loading);
    }

    #[test]
    fn test_parse_predictions() {
        assert!(matches!(parse_command("up"), Command::Predict(Direction::Up)));
        assert!(matches!(parse_command(" D "), Command::Predict(Direction::Down)));
    }

    #[test]
    fn test_parse_new_ticker() {
        match parse_command("new  msft ") {
            Command::New(t) => assert_eq!(t, "msft"),
            _ => panic!("expected new"),
        }
        match parse_command("new") {
            Command::New(t) => assert!(t.is_empty()),
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_parse_other_commands() {
        assert!(matches!(parse_command("end"), Command::End));
        assert!(matches!(parse_command("q"), Command::Quit));
        assert!(matches!(parse_command("status"), Command::Status));
        assert!(matches!(parse_command("sideways"), Command::Unknown(_)));
    }
}
