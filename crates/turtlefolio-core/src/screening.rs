use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ScreenError, Ticker, ValidationError};

/// Named fundamental screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Value,
    Growth,
}

const VALUE_FILTERS: &[(&str, &str)] = &[
    ("Debt/Equity", "Under 1"),
    ("PEG", "Low (<1)"),
    ("Operating Margin", "Positive (>0%)"),
    ("P/B", "Low (<1)"),
    ("P/E", "Low (<15)"),
    ("InsiderTransactions", "Positive (>0%)"),
];

const GROWTH_FILTERS: &[(&str, &str)] = &[
    ("Debt/Equity", "Under 1"),
    ("PEG", "High (>2)"),
    ("EPS growthqtr over qtr", "Positive (>0%)"),
    ("EPS growthnext 5 years", "High (>25%)"),
    ("Return on Equity", "Over +15%"),
];

impl Strategy {
    pub const ALL: [Self; 2] = [Self::Value, Self::Growth];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Growth => "growth",
        }
    }

    /// Screener filter name/value pairs for this strategy.
    pub const fn filters(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Value => VALUE_FILTERS,
            Self::Growth => GROWTH_FILTERS,
        }
    }

    /// File name holding this strategy's screener overview.
    pub fn overview_file_name(self) -> String {
        format!("{}_Overview.csv", self.as_str())
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "growth" => Ok(Self::Growth),
            _ => Err(ValidationError::InvalidStrategy {
                value: value.to_owned(),
            }),
        }
    }
}

pub type ScreenFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Ticker>, ScreenError>> + Send + 'a>>;

/// Produces the tickers matching a strategy.
pub trait Screener: Send + Sync {
    fn screen<'a>(&'a self, strategy: Strategy) -> ScreenFuture<'a>;
}

/// Reads a saved screener overview (`<dir>/<strategy>_Overview.csv`).
///
/// Only the `Ticker` column is used. Invalid symbols are skipped with a
/// warning and duplicates keep their first position.
#[derive(Debug, Clone)]
pub struct OverviewCsvScreener {
    dir: PathBuf,
}

impl OverviewCsvScreener {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, strategy: Strategy) -> PathBuf {
        self.dir.join(strategy.overview_file_name())
    }

    async fn load(&self, strategy: Strategy) -> Result<Vec<Ticker>, ScreenError> {
        let path = self.path_for(strategy);
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => ScreenError::NotFound {
                    path: path.display().to_string(),
                },
                _ => ScreenError::Io(error),
            })?;

        let tickers = tickers_from_overview(&body, &path)?;
        tracing::info!(
            strategy = %strategy,
            found = tickers.len(),
            path = %path.display(),
            "screened tickers"
        );
        Ok(tickers)
    }
}

impl Screener for OverviewCsvScreener {
    fn screen<'a>(&'a self, strategy: Strategy) -> ScreenFuture<'a> {
        Box::pin(self.load(strategy))
    }
}

fn tickers_from_overview(body: &str, path: &Path) -> Result<Vec<Ticker>, ScreenError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let column = reader
        .headers()?
        .iter()
        .position(|header| header == "Ticker")
        .ok_or_else(|| ScreenError::MissingColumn {
            column: "Ticker",
            path: path.display().to_string(),
        })?;

    let mut seen = BTreeSet::new();
    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(raw) = record.get(column) else {
            continue;
        };
        match Ticker::parse(raw) {
            Ok(ticker) => {
                if seen.insert(ticker.clone()) {
                    tickers.push(ticker);
                }
            }
            Err(error) => tracing::warn!(value = raw, %error, "skipping invalid screener ticker"),
        }
    }
    Ok(tickers)
}
