//! # Domain Models
//!
//! Canonical domain types for turtlefolio price analysis.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated, upper-cased market symbol |
//! | [`PriceBar`] | Daily OHLC bar |
//! | [`PriceSeries`] | Strictly date-ordered bars for one ticker |
//!
//! Construction validates every invariant, so an existing `PriceSeries` is
//! always sorted and free of duplicate dates.

pub mod date;
mod price_bar;
mod ticker;

pub use date::{format_date, parse_date};
pub use price_bar::{PriceBar, PriceSeries};
pub use ticker::Ticker;
