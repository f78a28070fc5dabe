//! Single-ticker analysis: fetch history, compute indicators, classify.
//!
//! [`Analyzer::analyze`] never returns an error. Every failure below it
//! (calendar, transport, parsing) is folded into an [`AnalysisOutcome`] so
//! that the batch coordinator only ever handles completed results.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

use serde::Serialize;
use time::macros::date;
use time::Date;

use crate::calendar::{holidays_around, last_trading_day, Clock, Market, SystemClock};
use crate::coordinator::BatchReport;
use crate::data_source::{HistoryRequest, PriceSource};
use crate::domain::date::iso_date;
use crate::indicators::{compute_indicators, IndicatorSeries, TurtleParams};
use crate::{IndicatorError, Signal, Ticker};

/// History window and indicator settings shared by every ticker in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// First date requested from the price source.
    pub start_date: Date,
    pub market: Market,
    pub params: TurtleParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: date!(2022 - 01 - 01),
            market: Market::default(),
            params: TurtleParams::default(),
        }
    }
}

/// Latest-bar summary of a completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurtleReport {
    pub signal: Signal,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub close: f64,
    pub breakout_window: usize,
    pub channel_high: Option<f64>,
    pub channel_low: Option<f64>,
    pub sma: Option<f64>,
    pub atr: Option<f64>,
    pub cumulative_return: Option<f64>,
    pub bars: usize,
    #[serde(skip)]
    pub series: IndicatorSeries,
}

impl TurtleReport {
    /// Summarise the final row; `None` when the series is empty.
    pub fn from_series(series: IndicatorSeries, params: &TurtleParams) -> Option<Self> {
        let latest = series.latest()?.clone();
        Some(Self {
            signal: latest.signal(),
            date: latest.date,
            close: latest.close,
            breakout_window: params.breakout_window,
            channel_high: latest.channel_high,
            channel_low: latest.channel_low,
            sma: latest.sma,
            atr: latest.atr,
            cumulative_return: latest.cumulative_return,
            bars: series.len(),
            series,
        })
    }
}

/// What happened to one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Completed(TurtleReport),
    /// The source answered but had no bars in the window.
    NoData,
    Failed { reason: String },
}

impl AnalysisOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::NoData => "no_data",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn report(&self) -> Option<&TurtleReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn signal(&self) -> Option<Signal> {
        self.report().map(|report| report.signal)
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-ticker result handed to callers and sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub ticker: Ticker,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}

impl AnalysisResult {
    pub fn new(ticker: Ticker, outcome: AnalysisOutcome) -> Self {
        Self { ticker, outcome }
    }

    pub fn failed(ticker: Ticker, reason: impl Into<String>) -> Self {
        Self::new(
            ticker,
            AnalysisOutcome::Failed {
                reason: reason.into(),
            },
        )
    }
}

/// Human-facing side channel for analysis progress.
///
/// Sinks are shared across worker tasks, so each call must write its whole
/// block at once.
pub trait ReportSink: Send + Sync {
    fn started(&self, _ticker: &Ticker) {}

    fn finished(&self, result: &AnalysisResult);

    fn batch_finished(&self, _report: &BatchReport) {}
}

/// Discards everything. Used for JSON output and embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReport;

impl ReportSink for SilentReport {
    fn finished(&self, _result: &AnalysisResult) {}
}

/// Plain-text summaries on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

impl ConsoleReport {
    fn emit(text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout is not worth failing an analysis over.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

impl ReportSink for ConsoleReport {
    fn started(&self, ticker: &Ticker) {
        Self::emit(&format!("Running Turtle Trading for {ticker}...\n"));
    }

    fn finished(&self, result: &AnalysisResult) {
        Self::emit(&render_result(result));
    }

    fn batch_finished(&self, report: &BatchReport) {
        let mut text = String::from("\nAll stock analyses complete. Here are the results:\n");
        for result in report.ordered(report.requested()) {
            let summary = match &result.outcome {
                AnalysisOutcome::Completed(turtle) => turtle.signal.to_string(),
                AnalysisOutcome::NoData => "no data".to_owned(),
                AnalysisOutcome::Failed { reason } => format!("error: {reason}"),
            };
            let _ = writeln!(text, "Ticker: {}, Analysis Result: {summary}", result.ticker);
        }
        Self::emit(&text);
    }
}

/// Text block printed by [`ConsoleReport`] for one ticker.
pub fn render_result(result: &AnalysisResult) -> String {
    let ticker = &result.ticker;
    let mut text = String::new();
    match &result.outcome {
        AnalysisOutcome::Completed(report) => {
            let window = report.breakout_window;
            let _ = writeln!(text, "Signal for {ticker}: {}", report.signal);
            let _ = writeln!(text, "Cumulative Return: {}", fmt_value(report.cumulative_return));
            let _ = writeln!(text, "Closing Price: {:.2}", report.close);
            let _ = writeln!(text, "{window}-Day High: {}", fmt_value(report.channel_high));
            let _ = writeln!(text, "{window}-Day Low: {}", fmt_value(report.channel_low));
        }
        AnalysisOutcome::NoData => {
            let _ = writeln!(text, "No trading data available for {ticker}.");
        }
        AnalysisOutcome::Failed { reason } => {
            let _ = writeln!(text, "Error analyzing {ticker}: {reason}");
        }
    }
    text
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |value| format!("{value:.2}"))
}

/// Runs the fetch → indicators → signal pipeline for one ticker.
#[derive(Clone)]
pub struct Analyzer {
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    config: AnalysisConfig,
    sink: Arc<dyn ReportSink>,
}

impl Analyzer {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            config: AnalysisConfig::default(),
            sink: Arc::new(SilentReport),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn sink(&self) -> &Arc<dyn ReportSink> {
        &self.sink
    }

    /// Analyze `ticker`, reporting through the sink and the log.
    pub async fn analyze(&self, ticker: Ticker) -> AnalysisResult {
        self.sink.started(&ticker);
        let outcome = self.run(&ticker).await;

        match &outcome {
            AnalysisOutcome::Completed(report) => tracing::info!(
                ticker = %ticker,
                signal = %report.signal,
                date = %report.date,
                bars = report.bars,
                "analysis completed"
            ),
            AnalysisOutcome::NoData => {
                tracing::warn!(ticker = %ticker, "no price data in analysis window");
            }
            AnalysisOutcome::Failed { reason } => {
                tracing::error!(ticker = %ticker, reason = %reason, "analysis failed");
            }
        }

        let result = AnalysisResult::new(ticker, outcome);
        self.sink.finished(&result);
        result
    }

    async fn run(&self, ticker: &Ticker) -> AnalysisOutcome {
        if let Err(error) = self.config.params.validate() {
            return AnalysisOutcome::Failed {
                reason: error.to_string(),
            };
        }

        let today = self.clock.today();
        let holidays = holidays_around(self.config.market, today);
        let end = match last_trading_day(today, &holidays) {
            Ok(end) => end,
            Err(error) => {
                return AnalysisOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        };
        let request = match HistoryRequest::new(ticker.clone(), self.config.start_date, end) {
            Ok(request) => request,
            // Start date after the last trading day: nothing to fetch.
            Err(_) => return AnalysisOutcome::NoData,
        };

        tracing::debug!(
            ticker = %ticker,
            source = %self.source.id(),
            start = %request.start,
            end = %request.end,
            "fetching price history"
        );
        let series = match self.source.price_history(request).await {
            Ok(series) => series,
            Err(error) => {
                return AnalysisOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        };
        if series.is_empty() {
            return AnalysisOutcome::NoData;
        }

        match compute_indicators(&series, &self.config.params) {
            Ok(indicators) => TurtleReport::from_series(indicators, &self.config.params)
                .map_or(AnalysisOutcome::NoData, AnalysisOutcome::Completed),
            Err(IndicatorError::InsufficientData { .. }) => AnalysisOutcome::NoData,
            Err(error) => AnalysisOutcome::Failed {
                reason: error.to_string(),
            },
        }
    }
}
