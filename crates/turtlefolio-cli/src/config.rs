//! Optional TOML settings, overridden by command-line flags.
//!
//! ```toml
//! start_date = "2022-01-01"
//! market = "nyse"
//! source = "csv"
//! data_dir = "prices"
//! out_dir = "out"
//! portfolio_file = "portfolios.json"
//! workers = 4
//! timeout_secs = 30
//!
//! [indicators]
//! breakout_window = 20
//! sma_window = 50
//! atr_window = 20
//! breakout = "inclusive"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use time::Date;
use turtlefolio_core::domain::date::iso_date;
use turtlefolio_core::{
    AnalysisConfig, CoordinatorConfig, Market, ProviderId, TurtleParams, DEFAULT_WORKERS,
};

use crate::cli::Cli;
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    #[serde(with = "iso_date")]
    pub start_date: Date,
    pub market: Market,
    pub source: ProviderId,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub portfolio_file: PathBuf,
    pub workers: usize,
    pub timeout_secs: Option<u64>,
    pub indicators: TurtleParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            start_date: analysis.start_date,
            market: analysis.market,
            source: ProviderId::default(),
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("out"),
            portfolio_file: PathBuf::from("portfolios.json"),
            workers: DEFAULT_WORKERS,
            timeout_secs: None,
            indicators: analysis.params,
        }
    }
}

impl AppConfig {
    /// Read `path` when given, else return defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let body = std::fs::read_to_string(path).map_err(|error| {
            CliError::Config(format!("cannot read {}: {error}", path.display()))
        })?;
        let config = Self::parse(&body)
            .map_err(|error| CliError::Config(format!("{}: {error}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn parse(body: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(body)
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(source) = cli.source {
            self.source = source;
        }
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.timeout_secs = Some(timeout_secs);
        }
        self
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.indicators.validate()?;
        self.coordinator_config().validate()?;
        Ok(())
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            start_date: self.start_date,
            market: self.market,
            params: self.indicators,
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            workers: self.workers,
            ticker_timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}
