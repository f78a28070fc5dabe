//! CLI argument definitions for turtlefolio.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyze` | Turtle breakout signal for one or more tickers |
//! | `export` | Write a ticker's indicator table to CSV |
//! | `screen` | List tickers from a saved value/growth screen |
//! | `sentiment` | Score news articles for a ticker |
//! | `portfolio` | Add, remove, or view a user's tickers |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | `$TURTLEFOLIO_CONFIG` | TOML settings file |
//! | `--source` | `yahoo` | Price source (yahoo, csv) |
//! | `--data-dir` | `data` | Directory of `<TICKER>.csv` files for `--source csv` |
//! | `--workers` | `8` | Concurrent analyses |
//! | `--timeout-secs` | none | Per-ticker analysis budget |
//! | `--format` | `table` | Output format (table, json) |
//! | `--quiet` | `false` | Only log warnings and errors |
//!
//! # Examples
//!
//! ```bash
//! turtlefolio analyze AAPL MSFT NVDA
//! turtlefolio --source csv --data-dir prices analyze IBM --format json
//! turtlefolio screen --strategy value --analyze
//! turtlefolio portfolio add --user ana KO
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use turtlefolio_core::{parse_date, ProviderId, Strategy};

/// Turtle breakout signals for personal portfolios.
#[derive(Debug, Parser)]
#[command(
    name = "turtlefolio",
    author,
    version,
    about = "Turtle breakout signals, screening, and news sentiment for stock portfolios"
)]
pub struct Cli {
    /// TOML settings file.
    #[arg(long, global = true, env = "TURTLEFOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Price source for historical bars.
    #[arg(long, global = true, value_parser = parse_source)]
    pub source: Option<ProviderId>,

    /// Directory holding `<TICKER>.csv` price files.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Maximum number of tickers analyzed concurrently.
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Per-ticker analysis timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Only log warnings and errors.
    #[arg(long, short, global = true, default_value_t = false)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Table,
    /// Single JSON document.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the latest Turtle signal for one or more tickers.
    ///
    /// Several tickers are analyzed concurrently and reported in the order
    /// given.
    ///
    ///   turtlefolio analyze AAPL
    ///   turtlefolio analyze AAPL MSFT GOOGL --workers 4
    Analyze(AnalyzeArgs),

    /// Save the full indicator table for a ticker as CSV.
    ///
    ///   turtlefolio export AAPL --out out
    Export(ExportArgs),

    /// List tickers from a saved fundamental screen.
    ///
    ///   turtlefolio screen --strategy value
    ///   turtlefolio screen --strategy growth --analyze
    Screen(ScreenArgs),

    /// Score news articles for a ticker and save the results as CSV.
    ///
    ///   turtlefolio sentiment AAPL --articles news/AAPL.json --start 2024-06-01
    Sentiment(SentimentArgs),

    /// Manage per-user portfolios.
    Portfolio(PortfolioArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// One or more ticker symbols.
    #[arg(required = true, num_args = 1..)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Ticker symbol to export.
    pub ticker: String,

    /// Output directory (default from config, `out`).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScreenArgs {
    /// Screening strategy.
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Strategy,

    /// Directory holding `<strategy>_Overview.csv` (default: output dir).
    #[arg(long)]
    pub overview_dir: Option<PathBuf>,

    /// Run the Turtle analysis over every screened ticker.
    #[arg(long, default_value_t = false)]
    pub analyze: bool,
}

#[derive(Debug, Args)]
pub struct SentimentArgs {
    /// Ticker the articles belong to.
    pub ticker: String,

    /// JSON file with an array of articles.
    #[arg(long)]
    pub articles: PathBuf,

    /// Earliest publish date (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_day)]
    pub start: Option<time::Date>,

    /// Latest publish date (YYYY-MM-DD), inclusive.
    #[arg(long, value_parser = parse_day)]
    pub end: Option<time::Date>,

    /// Output directory (default from config, `out`).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PortfolioArgs {
    #[command(subcommand)]
    pub command: PortfolioCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortfolioCommand {
    /// Add a ticker to a user's portfolio.
    Add(PortfolioTickerArgs),
    /// Remove a ticker from a user's portfolio.
    Remove(PortfolioTickerArgs),
    /// Show a user's tickers and analyze them.
    View(PortfolioUserArgs),
}

#[derive(Debug, Args)]
pub struct PortfolioTickerArgs {
    /// Portfolio owner.
    #[arg(long)]
    pub user: String,

    /// Ticker symbol.
    pub ticker: String,
}

#[derive(Debug, Args)]
pub struct PortfolioUserArgs {
    /// Portfolio owner.
    #[arg(long)]
    pub user: String,
}

fn parse_source(value: &str) -> Result<ProviderId, String> {
    value.parse().map_err(|error: turtlefolio_core::ValidationError| error.to_string())
}

fn parse_strategy(value: &str) -> Result<Strategy, String> {
    value.parse().map_err(|error: turtlefolio_core::ValidationError| error.to_string())
}

fn parse_day(value: &str) -> Result<time::Date, String> {
    parse_date(value).map_err(|error| error.to_string())
}
