use serde::Serialize;
use serde_json::Value;
use turtlefolio_core::Ticker;

use crate::cli::{Cli, OutputFormat, PortfolioArgs, PortfolioCommand};
use crate::config::AppConfig;
use crate::error::CliError;
use crate::portfolio::{AddOutcome, PortfolioStore};

use super::{batch_result, coordinator, CommandResult};

#[derive(Debug, Serialize)]
struct PortfolioData<'a> {
    user: &'a str,
    tickers: &'a [Ticker],
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<Value>,
}

pub async fn run(
    args: &PortfolioArgs,
    cli: &Cli,
    config: &AppConfig,
) -> Result<CommandResult, CliError> {
    let mut store = PortfolioStore::load(&config.portfolio_file)?;

    match &args.command {
        PortfolioCommand::Add(args) => {
            let ticker = Ticker::parse(&args.ticker)?;
            let line = match store.add(&args.user, ticker.clone()) {
                AddOutcome::Added => {
                    store.save()?;
                    format!("{ticker} has been added to your portfolio.")
                }
                AddOutcome::AlreadyPresent => format!("{ticker} is already in your portfolio."),
            };
            summary(&args.user, &store, line)
        }
        PortfolioCommand::Remove(args) => {
            let ticker = Ticker::parse(&args.ticker)?;
            let line = if store.remove(&args.user, &ticker) {
                store.save()?;
                format!("{ticker} has been removed from your portfolio.")
            } else {
                format!("{ticker} is not in your portfolio.")
            };
            summary(&args.user, &store, line)
        }
        PortfolioCommand::View(args) => {
            let tickers = store.tickers(&args.user);
            if tickers.is_empty() {
                let line = format!("No portfolio found for {}.", args.user);
                return summary(&args.user, &store, line);
            }

            let listing = format!("Stocks in {}'s portfolio: {}", args.user, join(tickers));
            if cli.format == OutputFormat::Table {
                println!("{listing}");
            }
            let batch = coordinator(config, cli.format)?.analyze_many(tickers).await;
            let analysis = batch_result(&batch)?;
            let data = serde_json::to_value(PortfolioData {
                user: &args.user,
                tickers,
                analysis: Some(analysis.data),
            })?;
            Ok(CommandResult::ok(data).with_failures(analysis.failed, analysis.total))
        }
    }
}

fn summary(user: &str, store: &PortfolioStore, line: String) -> Result<CommandResult, CliError> {
    let data = serde_json::to_value(PortfolioData {
        user,
        tickers: store.tickers(user),
        analysis: None,
    })?;
    Ok(CommandResult::ok(data).with_line(line))
}

fn join(tickers: &[Ticker]) -> String {
    let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
    format!("[{}]", symbols.join(", "))
}
