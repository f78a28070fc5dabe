//! CSV export and re-import of indicator series.
//!
//! One row per bar; undefined rolling values are written as empty cells.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::indicators::{IndicatorRow, IndicatorSeries};
use crate::{ExportError, Ticker};

pub const INDICATOR_COLUMNS: [&str; 16] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "channel_high",
    "channel_low",
    "sma",
    "true_range",
    "atr",
    "buy_signal",
    "sell_signal",
    "position",
    "daily_return",
    "cumulative_return",
];

/// File name used for a ticker's indicator export.
pub fn indicator_file_name(ticker: &Ticker) -> String {
    format!("{ticker}_turtle_trading.csv")
}

/// Write `series` as CSV with a header row.
pub fn write_indicator_csv<W: Write>(
    writer: W,
    series: &IndicatorSeries,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(INDICATOR_COLUMNS)?;
    for row in series.rows() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `series` to `<dir>/<TICKER>_turtle_trading.csv`, creating `dir`.
pub fn save_indicator_csv(dir: &Path, series: &IndicatorSeries) -> Result<PathBuf, ExportError> {
    let (path, file) = create_in(dir, &indicator_file_name(&series.ticker))?;
    write_indicator_csv(file, series)?;
    tracing::info!(
        ticker = %series.ticker,
        rows = series.len(),
        path = %path.display(),
        "saved indicator export"
    );
    Ok(path)
}

/// Read an indicator CSV written by [`write_indicator_csv`].
pub fn read_indicator_csv<R: Read>(
    reader: R,
    ticker: Ticker,
) -> Result<IndicatorSeries, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.iter().ne(INDICATOR_COLUMNS) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(ExportError::Malformed {
            row: 0,
            message: format!("unexpected header: {}", found.join(",")),
        });
    }

    let mut rows: Vec<IndicatorRow> = Vec::new();
    for (index, record) in csv_reader.deserialize::<IndicatorRow>().enumerate() {
        let row = record?;
        if let Some(previous) = rows.last() {
            if previous.date >= row.date {
                return Err(ExportError::Malformed {
                    row: index + 1,
                    message: format!("date {} does not follow {}", row.date, previous.date),
                });
            }
        }
        rows.push(row);
    }

    Ok(IndicatorSeries::from_rows(ticker, rows))
}

/// Create `dir` if needed and open `<dir>/<file_name>` for writing.
pub(crate) fn create_in(dir: &Path, file_name: &str) -> std::io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let file = File::create(&path)?;
    Ok((path, file))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::indicators::{compute_indicators, TurtleParams};
    use crate::{PriceBar, PriceSeries};

    fn series(closes: &[f64]) -> IndicatorSeries {
        let start = date!(2024 - 03 - 01);
        let bars = closes
            .iter()
            .enumerate()
            .map(|(offset, &close)| {
                let day = start + time::Duration::days(offset as i64);
                PriceBar::new(day, close, close + 0.5, close - 0.5, close, Some(10)).expect("bar")
            })
            .collect();
        let prices = PriceSeries::new(Ticker::parse("IBM").expect("ticker"), bars).expect("series");
        let params = TurtleParams {
            breakout_window: 2,
            sma_window: 3,
            atr_window: 2,
            ..TurtleParams::default()
        };
        compute_indicators(&prices, &params).expect("indicators")
    }

    #[test]
    fn header_and_empty_cells() {
        let mut buffer = Vec::new();
        write_indicator_csv(&mut buffer, &series(&[10.0, 11.0, 12.0])).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some(INDICATOR_COLUMNS.join(",").as_str()));
        let first = lines.next().expect("first row");
        assert!(first.starts_with("2024-03-01,10.0,10.5,9.5,10.0,10,,,,"), "{first}");
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn read_rejects_foreign_header() {
        let ticker = Ticker::parse("IBM").expect("ticker");
        let err = read_indicator_csv("Date,Open\n2024-01-01,1\n".as_bytes(), ticker)
            .expect_err("must fail");
        assert!(matches!(err, ExportError::Malformed { row: 0, .. }));
    }

    #[test]
    fn save_creates_directory_and_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");

        let path = save_indicator_csv(&out, &series(&[10.0, 9.0])).expect("save");

        assert_eq!(path, out.join("IBM_turtle_trading.csv"));
        assert!(path.exists());
    }
}
