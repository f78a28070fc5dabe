use serde::{Deserialize, Serialize};
use time::Date;

use super::date::iso_date;
use crate::{Ticker, ValidationError};

/// Daily OHLC bar for one trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Build a validated bar.
    ///
    /// Open and close may sit outside `[low, high]`: providers adjust closes
    /// for splits and dividends without touching the intraday range.
    pub fn new(
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Date-ordered price history for a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    pub ticker: Ticker,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Wrap bars that must already be strictly increasing by date.
    pub fn new(ticker: Ticker, bars: Vec<PriceBar>) -> Result<Self, ValidationError> {
        for pair in bars.windows(2) {
            let (previous, next) = (pair[0].date, pair[1].date);
            if previous == next {
                return Err(ValidationError::DuplicateBarDate { date: next });
            }
            if previous > next {
                return Err(ValidationError::UnorderedBars { previous, next });
            }
        }

        Ok(Self { ticker, bars })
    }

    /// Sort bars by date first; duplicates are still rejected.
    pub fn from_unordered(
        ticker: Ticker,
        mut bars: Vec<PriceBar>,
    ) -> Result<Self, ValidationError> {
        bars.sort_by_key(|bar| bar.date);
        Self::new(ticker, bars)
    }

    pub fn empty(ticker: Ticker) -> Self {
        Self {
            ticker,
            bars: Vec::new(),
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
