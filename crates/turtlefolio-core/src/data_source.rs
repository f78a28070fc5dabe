//! Price source contract and request/error types.
//!
//! Every provider adapter implements [`PriceSource`]. The analyzer only ever
//! talks to this trait, so tests and offline runs can substitute any
//! implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use turtlefolio_core::{HistoryRequest, PriceSource, Ticker, YahooAdapter};
//! use time::macros::date;
//!
//! async fn fetch(adapter: &YahooAdapter) -> Result<(), Box<dyn std::error::Error>> {
//!     let request = HistoryRequest::new(
//!         Ticker::parse("AAPL")?,
//!         date!(2022 - 01 - 01),
//!         date!(2024 - 06 - 07),
//!     )?;
//!     let series = adapter.price_history(request).await?;
//!     println!("{} bars", series.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::{PriceSeries, ProviderId, Ticker, ValidationError};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Parse,
    Internal,
}

/// Structured error returned by price sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message, true)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message, false)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotFound, message, false)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Parse, message, false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message, false)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Daily history request over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub ticker: Ticker,
    pub start: Date,
    pub end: Date,
}

impl HistoryRequest {
    pub fn new(ticker: Ticker, start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedDateRange { start, end });
        }
        Ok(Self { ticker, start, end })
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Boxed future returned by [`PriceSource::price_history`].
pub type HistoryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;

/// Provider of daily price history.
///
/// An empty [`PriceSeries`] is a valid answer meaning the provider has no
/// bars in range; errors are reserved for transport, parsing, or lookup
/// failures.
///
/// Implementations must be `Send + Sync`; the coordinator shares one
/// instance across all worker tasks.
pub trait PriceSource: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches daily bars for `req.ticker` between `req.start` and
    /// `req.end`, both inclusive.
    fn price_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a>;
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn rejects_inverted_range() {
        let ticker = Ticker::parse("AAPL").expect("ticker");
        let err = HistoryRequest::new(ticker, date!(2024 - 02 - 01), date!(2024 - 01 - 01))
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvertedDateRange { .. }));
    }

    #[test]
    fn range_is_inclusive() {
        let ticker = Ticker::parse("AAPL").expect("ticker");
        let req = HistoryRequest::new(ticker, date!(2024 - 01 - 01), date!(2024 - 01 - 31))
            .expect("valid");
        assert!(req.contains(date!(2024 - 01 - 01)));
        assert!(req.contains(date!(2024 - 01 - 31)));
        assert!(!req.contains(date!(2024 - 02 - 01)));
    }

    #[test]
    fn error_codes_are_stable() {
        let err = SourceError::not_found("no file for ZZZ");
        assert_eq!(err.code(), "source.not_found");
        assert!(!err.retryable());
        assert_eq!(err.to_string(), "no file for ZZZ (source.not_found)");
        assert!(SourceError::rate_limited("slow down").retryable());
    }
}
