use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] turtlefolio_core::ValidationError),

    #[error("config error: {0}")]
    Config(String),

    #[error("{failed} of {total} tickers failed")]
    TickersFailed { failed: usize, total: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] turtlefolio_core::CoreError),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::TickersFailed { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
            Self::Core(error) => match error {
                turtlefolio_core::CoreError::Validation(_) => 2,
                turtlefolio_core::CoreError::Serialization(_) => 4,
                _ => 10,
            },
        }
    }
}

impl From<turtlefolio_core::ExportError> for CliError {
    fn from(error: turtlefolio_core::ExportError) -> Self {
        Self::Core(error.into())
    }
}

impl From<turtlefolio_core::SentimentError> for CliError {
    fn from(error: turtlefolio_core::SentimentError) -> Self {
        Self::Core(error.into())
    }
}

impl From<turtlefolio_core::ScreenError> for CliError {
    fn from(error: turtlefolio_core::ScreenError) -> Self {
        Self::Core(error.into())
    }
}
