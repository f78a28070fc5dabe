//! # Turtlefolio Core
//!
//! Breakout-signal analysis for personal stock portfolios.
//!
//! ## Overview
//!
//! - **Trading-day calendar** with US federal and NYSE holiday sets
//! - **Indicator engine**: rolling channel extremes, SMA, true range/ATR,
//!   breakout signals, position and compounded returns
//! - **Single-ticker analyzer** that folds every failure into a result
//! - **Parallel coordinator** with a bounded worker pool, per-ticker
//!   timeouts and failure isolation
//! - **Price sources** for Yahoo Finance and local CSV files
//! - **Exports**, news **sentiment** scoring and fundamental **screening**
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo chart and CSV price sources |
//! | [`analyzer`] | Fetch → indicators → signal for one ticker |
//! | [`calendar`] | Holidays, clocks, last trading day |
//! | [`coordinator`] | Bounded fan-out across tickers |
//! | [`data_source`] | Price source trait and request/error types |
//! | [`domain`] | Tickers, bars, price series, ISO dates |
//! | [`error`] | Error enums per layer |
//! | [`export`] | Indicator CSV export and re-import |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`indicators`] | Indicator engine |
//! | [`retry`] | Backoff policy for provider calls |
//! | [`screening`] | Value/growth screens |
//! | [`sentiment`] | Article sentiment scoring and export |
//! | [`signal`] | BUY/SELL/HOLD classification |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turtlefolio_core::{Analyzer, Coordinator, CoordinatorConfig, Ticker, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = Analyzer::new(Arc::new(YahooAdapter::default()));
//!     let coordinator = Coordinator::new(analyzer, CoordinatorConfig::default())?;
//!
//!     let tickers = Ticker::parse_all(&["AAPL", "MSFT", "NVDA"])?;
//!     let batch = coordinator.analyze_many(&tickers).await;
//!     for result in batch.ordered(&tickers) {
//!         println!("{}: {:?}", result.ticker, result.outcome.signal());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Calendar   │──▶│  Indicators  │──▶│   Analyzer   │──▶│ Coordinator  │
//! └──────────────┘   └──────────────┘   └──────┬───────┘   └──────────────┘
//!                                              │
//!                                              ▼
//!                                       ┌──────────────┐   ┌──────────────┐
//!                                       │ PriceSource  │──▶│ HTTP / CSV   │
//!                                       └──────────────┘   └──────────────┘
//! ```

pub mod adapters;
pub mod analyzer;
pub mod calendar;
pub mod coordinator;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod export;
pub mod http_client;
pub mod indicators;
pub mod retry;
pub mod screening;
pub mod sentiment;
pub mod signal;
pub mod source;

// Price sources
pub use adapters::{source_for, CsvPriceSource, YahooAdapter};

// Analysis pipeline
pub use analyzer::{
    render_result, AnalysisConfig, AnalysisOutcome, AnalysisResult, Analyzer, ConsoleReport,
    ReportSink, SilentReport, TurtleReport,
};
pub use coordinator::{BatchReport, Coordinator, CoordinatorConfig, DEFAULT_WORKERS};

// Calendar
pub use calendar::{
    holidays_around, holidays_for, is_trading_day, last_trading_day, Clock, FixedClock, Market,
    SystemClock, MAX_LOOKBACK_DAYS,
};

// Data source trait and types
pub use data_source::{HistoryFuture, HistoryRequest, PriceSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{format_date, parse_date, PriceBar, PriceSeries, Ticker};

// Error types
pub use error::{
    CalendarError, CoreError, ExportError, IndicatorError, ScreenError, SentimentError,
    ValidationError,
};

// Export
pub use export::{read_indicator_csv, save_indicator_csv, write_indicator_csv};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Indicators
pub use indicators::{
    compute_indicators, BreakoutWindow, IndicatorRow, IndicatorSeries, TurtleParams,
};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Screening
pub use screening::{OverviewCsvScreener, Screener, Strategy};

// Sentiment
pub use sentiment::{
    chunk_text, save_sentiment_csv, score_articles, write_sentiment_csv, Article,
    JsonNewsSource, LexiconClassifier, NewsSource, SentimentClassifier, SentimentLabel,
    SentimentReport, SentimentSummary,
};

// Signals and provider identifiers
pub use signal::Signal;
pub use source::ProviderId;
