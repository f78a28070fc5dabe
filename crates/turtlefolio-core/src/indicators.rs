//! Turtle breakout indicator engine.
//!
//! Turns a [`PriceSeries`] into an [`IndicatorSeries`] with one row per bar:
//!
//! | Field | Rule |
//! |-------|------|
//! | `channel_high` / `channel_low` | max(high) / min(low) over the breakout window |
//! | `sma` | mean(close) over the SMA window |
//! | `true_range` | max(H-L, \|H-prevC\|, \|L-prevC\|); H-L on the first bar |
//! | `atr` | mean(true range) over the ATR window |
//! | `buy_signal` / `sell_signal` | close above channel high / below channel low |
//! | `position` | +1 buy, -1 sell, 0 otherwise (buy checked first) |
//! | `daily_return` | previous position times close-to-close percent change |
//! | `cumulative_return` | running product of (1 + daily return) |
//!
//! Rolling fields are `None` until their window is full. With the default
//! [`BreakoutWindow::Inclusive`] the channel includes the current bar, so a
//! breakout needs a close beyond the bar's own high or low.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::date::iso_date;
use crate::{IndicatorError, PriceBar, PriceSeries, Signal, Ticker, ValidationError};

/// Which bars the breakout channel is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutWindow {
    /// Trailing window ending at and including the current bar.
    #[default]
    Inclusive,
    /// Trailing window ending at the previous bar.
    Prior,
}

/// Window lengths and breakout mode for the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleParams {
    pub breakout_window: usize,
    pub sma_window: usize,
    pub atr_window: usize,
    pub breakout: BreakoutWindow,
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            breakout_window: 20,
            sma_window: 50,
            atr_window: 20,
            breakout: BreakoutWindow::Inclusive,
        }
    }
}

impl TurtleParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("breakout_window", self.breakout_window),
            ("sma_window", self.sma_window),
            ("atr_window", self.atr_window),
        ] {
            if value == 0 {
                return Err(ValidationError::ZeroWindow { name });
            }
        }
        Ok(())
    }
}

/// Price bar plus every derived indicator for that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
    pub channel_high: Option<f64>,
    pub channel_low: Option<f64>,
    pub sma: Option<f64>,
    pub true_range: f64,
    pub atr: Option<f64>,
    pub buy_signal: bool,
    pub sell_signal: bool,
    pub position: i8,
    pub daily_return: Option<f64>,
    pub cumulative_return: Option<f64>,
}

impl IndicatorRow {
    pub fn signal(&self) -> Signal {
        Signal::classify(self.buy_signal, self.sell_signal)
    }
}

/// Indicator rows aligned one-to-one with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub ticker: Ticker,
    rows: Vec<IndicatorRow>,
}

impl IndicatorSeries {
    /// Wrap rows that were produced elsewhere, e.g. re-read from an export.
    pub fn from_rows(ticker: Ticker, rows: Vec<IndicatorRow>) -> Self {
        Self { ticker, rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// Signal of the most recent bar; `None` for an empty series.
    pub fn signal(&self) -> Option<Signal> {
        self.latest().map(IndicatorRow::signal)
    }
}

/// Compute the full indicator set for `series`.
///
/// Fails on an empty series or on a zero-length window.
pub fn compute_indicators(
    series: &PriceSeries,
    params: &TurtleParams,
) -> Result<IndicatorSeries, IndicatorError> {
    params.validate()?;
    let bars = series.bars();
    if bars.is_empty() {
        return Err(IndicatorError::InsufficientData {
            ticker: series.ticker.to_string(),
        });
    }

    let true_ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(index, bar)| true_range(bar, index.checked_sub(1).map(|prev| &bars[prev])))
        .collect();

    let mut rows: Vec<IndicatorRow> = Vec::with_capacity(bars.len());
    let mut cumulative = 1.0;

    for (index, bar) in bars.iter().enumerate() {
        let channel = match params.breakout {
            BreakoutWindow::Inclusive => trailing(bars, index + 1, params.breakout_window),
            BreakoutWindow::Prior => trailing(bars, index, params.breakout_window),
        };
        let channel_high = channel.map(|window| fold(window.iter().map(|b| b.high), f64::max));
        let channel_low = channel.map(|window| fold(window.iter().map(|b| b.low), f64::min));

        let sma = trailing(bars, index + 1, params.sma_window)
            .map(|window| mean(window.iter().map(|b| b.close)));
        let atr = trailing(&true_ranges, index + 1, params.atr_window)
            .map(|window| mean(window.iter().copied()));

        let buy_signal = channel_high.is_some_and(|high| bar.close > high);
        let sell_signal = channel_low.is_some_and(|low| bar.close < low);
        let position = Signal::classify(buy_signal, sell_signal).position();

        let daily_return = rows.last().and_then(|previous| {
            percent_change(previous.close, bar.close)
                .map(|change| f64::from(previous.position) * change)
        });
        let cumulative_return = daily_return.map(|value| {
            cumulative *= 1.0 + value;
            cumulative
        });

        rows.push(IndicatorRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            channel_high,
            channel_low,
            sma,
            true_range: true_ranges[index],
            atr,
            buy_signal,
            sell_signal,
            position,
            daily_return,
            cumulative_return,
        });
    }

    Ok(IndicatorSeries {
        ticker: series.ticker.clone(),
        rows,
    })
}

fn true_range(bar: &PriceBar, previous: Option<&PriceBar>) -> f64 {
    let range = bar.high - bar.low;
    match previous {
        Some(previous) => range
            .max((bar.high - previous.close).abs())
            .max((bar.low - previous.close).abs()),
        None => range,
    }
}

/// The `window` items ending just before `end`, if that many exist.
fn trailing<T>(items: &[T], end: usize, window: usize) -> Option<&[T]> {
    let start = end.checked_sub(window)?;
    items.get(start..end)
}

fn fold(values: impl Iterator<Item = f64>, pick: fn(f64, f64) -> f64) -> f64 {
    values.reduce(pick).unwrap_or(f64::NAN)
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len() as f64;
    values.sum::<f64>() / count
}

fn percent_change(previous: f64, current: f64) -> Option<f64> {
    (previous != 0.0).then(|| current / previous - 1.0)
}
