use crate::cli::{AnalyzeArgs, Cli};
use crate::config::AppConfig;
use crate::error::CliError;

use super::{batch_result, coordinator, parse_tickers, CommandResult};

pub async fn run(
    args: &AnalyzeArgs,
    cli: &Cli,
    config: &AppConfig,
) -> Result<CommandResult, CliError> {
    let tickers = parse_tickers(&args.tickers)?;
    let coordinator = coordinator(config, cli.format)?;

    if let [ticker] = tickers.as_slice() {
        let result = coordinator.analyze(ticker.clone()).await;
        let failed = usize::from(result.outcome.is_failure());
        let data = serde_json::to_value(&result)?;
        return Ok(CommandResult::ok(data).with_failures(failed, 1));
    }

    let batch = coordinator.analyze_many(&tickers).await;
    batch_result(&batch)
}
