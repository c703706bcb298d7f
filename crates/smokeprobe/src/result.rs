//! Result and error types for Smokeprobe.

use thiserror::Error;

use crate::scenario::ScenarioState;
use crate::selector::{Selector, SelectorList};

/// Result type for Smokeprobe operations
pub type SmokeResult<T> = Result<T, SmokeError>;

/// Errors that can occur in Smokeprobe
#[derive(Debug, Error)]
pub enum SmokeError {
    /// A locate call was given no candidates
    #[error("Selector list `{name}` is empty")]
    EmptySelectorList {
        /// Logical control the list describes
        name: String,
    },

    /// The driver could not evaluate a selector
    #[error("Invalid selector {selector}: {message}")]
    InvalidSelector {
        /// Rendered selector
        selector: String,
        /// Driver message
        message: String,
    },

    /// No candidate in a selector list became visible in time
    #[error(
        "No element for `{list}` became visible ({attempted} candidates, {timeout_ms}ms each); last tried {last_selector}: {last_error}"
    )]
    LocateTimeout {
        /// Logical control the list describes
        list: String,
        /// Number of candidates attempted
        attempted: usize,
        /// Per-candidate timeout in milliseconds
        timeout_ms: u64,
        /// The last candidate that was attempted
        last_selector: Selector,
        /// What went wrong with the last candidate
        last_error: String,
    },

    /// A step of the smoke scenario failed
    #[error("Smoke scenario failed while {state}: {source}")]
    FlowFailure {
        /// State the scenario was in when it failed
        state: ScenarioState,
        /// Originating error
        #[source]
        source: Box<SmokeError>,
    },

    /// A best-effort step did not complete; recovered by the caller
    #[error("Optional step `{step}` skipped: {source}")]
    OptionalStepFailure {
        /// Step that was skipped
        step: String,
        /// Why it was skipped
        #[source]
        source: Box<SmokeError>,
    },

    /// Session-level failure (crashed browser, lost connection, ...)
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Browser launch or connection error
    #[error("Failed to start browser session: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input on element failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmokeError {
    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create an input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create an invalid-selector error
    #[must_use]
    pub fn invalid_selector(selector: &Selector, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            message: message.into(),
        }
    }

    /// Create an empty-list error for `list`
    #[must_use]
    pub fn empty_list(list: &SelectorList) -> Self {
        Self::EmptySelectorList {
            name: list.name().to_string(),
        }
    }

    /// Whether this is a locate timeout, the only kind optional steps may swallow
    #[must_use]
    pub const fn is_locate_timeout(&self) -> bool {
        matches!(self, Self::LocateTimeout { .. })
    }

    /// Unwrap wrapping failures down to the error that caused them
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::FlowFailure { source, .. } | Self::OptionalStepFailure { source, .. } => {
                source.root()
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_timeout_message_names_last_candidate() {
        let err = SmokeError::LocateTimeout {
            list: "password field".to_string(),
            attempted: 3,
            timeout_ms: 10_000,
            last_selector: Selector::input_type("password"),
            last_error: "not visible".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("password field"));
        assert!(text.contains("3 candidates"));
        assert!(text.contains("input[type=\"password\"]"));
        assert!(err.is_locate_timeout());
    }

    #[test]
    fn test_root_unwraps_nested_flow_failures() {
        let inner = SmokeError::session("browser crashed");
        let err = SmokeError::FlowFailure {
            state: ScenarioState::Authenticating,
            source: Box::new(inner),
        };
        assert!(matches!(err.root(), SmokeError::Session { .. }));
        assert!(!err.is_locate_timeout());
        assert!(err.to_string().contains("authenticating"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: SmokeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }

    #[test]
    fn test_invalid_selector_renders_selector() {
        let err = SmokeError::invalid_selector(&Selector::css("button:has-text(\"x\")"), "bad");
        assert!(err.to_string().contains("button:has-text"));
    }
}
