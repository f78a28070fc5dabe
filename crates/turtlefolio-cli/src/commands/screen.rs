use serde::Serialize;
use serde_json::Value;
use turtlefolio_core::{OverviewCsvScreener, Screener, Strategy, Ticker};

use crate::cli::{Cli, OutputFormat, ScreenArgs};
use crate::config::AppConfig;
use crate::error::CliError;

use super::{batch_result, coordinator, CommandResult};

#[derive(Debug, Serialize)]
struct ScreenData {
    strategy: Strategy,
    tickers: Vec<Ticker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<Value>,
}

pub async fn run(
    args: &ScreenArgs,
    cli: &Cli,
    config: &AppConfig,
) -> Result<CommandResult, CliError> {
    let dir = args.overview_dir.as_deref().unwrap_or(&config.out_dir);
    let tickers = OverviewCsvScreener::new(dir).screen(args.strategy).await?;
    let found = format!(
        "Stocks found using the {} strategy: {}",
        args.strategy,
        tickers.len()
    );

    if !args.analyze || tickers.is_empty() {
        let data = serde_json::to_value(ScreenData {
            strategy: args.strategy,
            tickers,
            analysis: None,
        })?;
        return Ok(CommandResult::ok(data).with_line(found));
    }

    // Printed before the analyses start so it precedes their progress.
    if cli.format == OutputFormat::Table {
        println!("{found}");
    }
    let batch = coordinator(config, cli.format)?.analyze_many(&tickers).await;
    let analysis = batch_result(&batch)?;
    let data = serde_json::to_value(ScreenData {
        strategy: args.strategy,
        tickers,
        analysis: Some(analysis.data),
    })?;
    Ok(CommandResult::ok(data).with_failures(analysis.failed, analysis.total))
}
