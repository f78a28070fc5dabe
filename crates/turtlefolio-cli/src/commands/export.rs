use serde::Serialize;
use turtlefolio_core::{save_indicator_csv, AnalysisOutcome, Ticker};

use crate::cli::{ExportArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliError;

use super::{coordinator, CommandResult};

#[derive(Debug, Serialize)]
struct ExportData {
    ticker: Ticker,
    path: Option<String>,
    rows: usize,
}

pub async fn run(args: &ExportArgs, config: &AppConfig) -> Result<CommandResult, CliError> {
    let ticker = Ticker::parse(&args.ticker)?;
    let out_dir = args.out.as_deref().unwrap_or(&config.out_dir);
    let result = coordinator(config, OutputFormat::Json)?.analyze(ticker.clone()).await;

    match result.outcome {
        AnalysisOutcome::Completed(report) => {
            let path = save_indicator_csv(out_dir, &report.series)?;
            let data = serde_json::to_value(ExportData {
                ticker: ticker.clone(),
                path: Some(path.display().to_string()),
                rows: report.series.len(),
            })?;
            Ok(CommandResult::ok(data).with_line(format!(
                "Saved {} rows for {ticker} to {}",
                report.series.len(),
                path.display()
            )))
        }
        AnalysisOutcome::NoData => {
            let data = serde_json::to_value(ExportData {
                ticker: ticker.clone(),
                path: None,
                rows: 0,
            })?;
            Ok(CommandResult::ok(data)
                .with_warning(format!("Skipping saving for {ticker} due to missing data.")))
        }
        AnalysisOutcome::Failed { reason } => {
            let data = serde_json::to_value(ExportData {
                ticker: ticker.clone(),
                path: None,
                rows: 0,
            })?;
            Ok(CommandResult::ok(data)
                .with_warning(format!("Error analyzing {ticker}: {reason}"))
                .with_failures(1, 1))
        }
    }
}
