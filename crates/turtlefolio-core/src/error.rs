use thiserror::Error;
use time::Date;

/// Validation and contract errors exposed by `turtlefolio-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of yahoo, csv")]
    InvalidSource { value: String },
    #[error("invalid market '{value}', expected one of us, nyse")]
    InvalidMarket { value: String },
    #[error("invalid strategy '{value}', expected one of value, growth")]
    InvalidStrategy { value: String },

    #[error("date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: Date, end: Date },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar dates must be strictly increasing: {previous} then {next}")]
    UnorderedBars { previous: Date, next: Date },
    #[error("duplicate bar date {date}")]
    DuplicateBarDate { date: Date },

    #[error("window '{name}' must be at least 1")]
    ZeroWindow { name: &'static str },
    #[error("worker pool size must be at least 1")]
    ZeroWorkers,
}

/// No weekday outside the holiday set was found while walking back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("no trading day found within {max_days} days before {reference}")]
    NoTradingDay { reference: Date, max_days: u32 },
    #[error("date arithmetic left the supported calendar range at {reference}")]
    OutOfRange { reference: Date },
}

/// Failures raised by the indicator engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("cannot compute indicators for '{ticker}': price history is empty")]
    InsufficientData { ticker: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures while writing or reading tabular exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures while loading articles or writing sentiment exports.
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid article file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures raised by fundamental screeners.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("screening results not found at {path}")]
    NotFound { path: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("column '{column}' missing from {path}")]
    MissingColumn { column: &'static str, path: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Sentiment(#[from] SentimentError),

    #[error(transparent)]
    Screen(#[from] ScreenError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
