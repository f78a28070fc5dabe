mod cli;
mod commands;
mod config;
mod error;
mod output;
mod portfolio;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli);
    config.validate()?;

    let result = commands::run(cli, &config).await?;
    output::render(&result, cli.format, cli.pretty)?;

    if result.failed > 0 {
        return Err(CliError::TickersFailed {
            failed: result.failed,
            total: result.total,
        });
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, or `warn` with `--quiet`.
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
