//! Error types for the CLI

use smokeprobe::{ScenarioState, SmokeError};
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The smoke scenario ran and failed
    #[error("Smoke test failed while {state}")]
    SmokeFailed {
        /// State the scenario stopped in
        state: ScenarioState,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Smokeprobe library error
    #[error("{0}")]
    Smoke(SmokeError),
}

impl From<SmokeError> for CliError {
    fn from(err: SmokeError) -> Self {
        match err {
            SmokeError::Config { message } => Self::Config { message },
            other => Self::Smoke(other),
        }
    }
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the failure has already been reported on the terminal
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::SmokeFailed { .. })
    }
}
