//! Local `<TICKER>.csv` price files in the yfinance export layout.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data_source::{HistoryFuture, HistoryRequest, PriceSource, SourceError};
use crate::{parse_date, PriceBar, PriceSeries, ProviderId};

/// Offline price source reading one `<TICKER>.csv` file per ticker.
///
/// Accepts the layout written by common download tools
/// (`Date,Open,High,Low,Close,Adj Close,Volume`) as well as the lowercase
/// columns of this crate's own indicator export. Extra columns are ignored
/// and rows with a missing price are skipped.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    async fn load(&self, req: HistoryRequest) -> Result<PriceSeries, SourceError> {
        let path = self.path_for(req.ticker.as_str());
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => {
                    SourceError::not_found(format!("no price file at {}", path.display()))
                }
                _ => SourceError::unavailable(format!(
                    "failed to read {}: {error}",
                    path.display()
                )),
            })?;

        let bars = parse_rows(&body, &req)?;
        tracing::debug!(
            ticker = %req.ticker,
            path = %path.display(),
            bars = bars.len(),
            "loaded csv price history"
        );
        PriceSeries::from_unordered(req.ticker, bars).map_err(SourceError::from)
    }
}

impl PriceSource for CsvPriceSource {
    fn id(&self) -> ProviderId {
        ProviderId::Csv
    }

    fn price_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(self.load(req))
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date")]
    date: String,
    #[serde(rename = "Open", alias = "open", default)]
    open: Option<f64>,
    #[serde(rename = "High", alias = "high", default)]
    high: Option<f64>,
    #[serde(rename = "Low", alias = "low", default)]
    low: Option<f64>,
    #[serde(rename = "Close", alias = "close", default)]
    close: Option<f64>,
    #[serde(rename = "Volume", alias = "volume", default)]
    volume: Option<f64>,
}

fn parse_rows(body: &str, req: &HistoryRequest) -> Result<Vec<PriceBar>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut bars = Vec::new();
    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|error| {
            SourceError::parse(format!("row {}: {error}", index + 1))
        })?;

        // Timestamped exports carry a time suffix after the ISO date.
        let date_text = row.date.get(..10).unwrap_or(&row.date);
        let date = parse_date(date_text)
            .map_err(|error| SourceError::parse(format!("row {}: {error}", index + 1)))?;
        if !req.contains(date) {
            continue;
        }

        let (Some(open), Some(high), Some(low), Some(close)) =
            (row.open, row.high, row.low, row.close)
        else {
            continue;
        };
        let volume = row
            .volume
            .filter(|volume| volume.is_finite() && *volume >= 0.0)
            .map(|volume| volume.round() as u64);

        let bar = PriceBar::new(date, open, high, low, close, volume)
            .map_err(|error| SourceError::parse(format!("row {}: {error}", index + 1)))?;
        bars.push(bar);
    }

    Ok(bars)
}
