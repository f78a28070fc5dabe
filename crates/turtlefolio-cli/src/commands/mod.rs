mod analyze;
mod export;
mod portfolio;
mod screen;
mod sentiment;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use turtlefolio_core::{
    source_for, AnalysisResult, Analyzer, BatchReport, ConsoleReport, Coordinator, ReportSink,
    SilentReport, SystemClock, Ticker,
};

use crate::cli::{Cli, Command, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliError;

/// What a command hands back for rendering.
///
/// `lines` are only printed in table format; `data` is the JSON document.
#[derive(Debug, Default)]
pub struct CommandResult {
    pub data: Value,
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
    pub failed: usize,
    pub total: usize,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_failures(mut self, failed: usize, total: usize) -> Self {
        self.failed = failed;
        self.total = total;
        self
    }
}

pub async fn run(cli: &Cli, config: &AppConfig) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Analyze(args) => analyze::run(args, cli, config).await,
        Command::Export(args) => export::run(args, config).await,
        Command::Screen(args) => screen::run(args, cli, config).await,
        Command::Sentiment(args) => sentiment::run(args, config).await,
        Command::Portfolio(args) => portfolio::run(args, cli, config).await,
    }
}

/// Build the analysis pipeline from merged settings.
///
/// Table output streams per-ticker blocks through [`ConsoleReport`]; JSON
/// output stays silent until the final document.
fn coordinator(config: &AppConfig, format: OutputFormat) -> Result<Coordinator, CliError> {
    let sink: Arc<dyn ReportSink> = match format {
        OutputFormat::Table => Arc::new(ConsoleReport),
        OutputFormat::Json => Arc::new(SilentReport),
    };
    let analyzer = Analyzer::new(source_for(config.source, &config.data_dir))
        .with_clock(Arc::new(SystemClock))
        .with_config(config.analysis_config())
        .with_sink(sink);

    Ok(Coordinator::new(analyzer, config.coordinator_config())?)
}

#[derive(Debug, Serialize)]
struct BatchData<'a> {
    results: Vec<&'a AnalysisResult>,
    completion_order: &'a [Ticker],
}

/// JSON payload for a batch, listed in requested order.
fn batch_result(batch: &BatchReport) -> Result<CommandResult, CliError> {
    let data = serde_json::to_value(BatchData {
        results: batch.ordered(batch.requested()),
        completion_order: &batch.completion_order,
    })?;
    Ok(CommandResult::ok(data).with_failures(batch.failures().len(), batch.len()))
}

fn parse_tickers(raw: &[String]) -> Result<Vec<Ticker>, CliError> {
    Ok(Ticker::parse_all(raw)?)
}
