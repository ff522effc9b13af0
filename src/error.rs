// src/error.rs

//! Unified error handling for the relay.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// WebDriver command failed
    #[cfg(feature = "webdriver")]
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Listing or detail page could not be read or parsed
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Durable state could not be written
    #[error("Persistence error at {location}: {message}")]
    Persistence { location: String, message: String },

    /// The categorization oracle failed or replied with something unusable
    #[error("Classification error: {0}")]
    Classification(String),

    /// Title already present in the recent-title ledger
    #[error("Duplicate announcement: {0}")]
    DuplicateConflict(String),

    /// An expected portal control never became ready
    #[error("Timed out after {waited:?} waiting for {control}")]
    AutomationTimeout { control: String, waited: Duration },

    /// The portal session cannot continue (e.g. credentials rejected)
    #[error("Automation fatal: {0}")]
    AutomationFatal(String),

    /// No board with the requested label exists on the course page
    #[error("Board not found on course page: {0}")]
    BoardNotFound(String),

    /// A publishing session operation was called from the wrong state
    #[error("Cannot {operation} while session is {state}")]
    InvalidTransition { operation: String, state: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for a page URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error for a storage location.
    pub fn persistence(location: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Create a classification error.
    pub fn classification(message: impl fmt::Display) -> Self {
        Self::Classification(message.to_string())
    }

    /// Create a timeout error for a portal control.
    pub fn timeout(control: impl Into<String>, waited: Duration) -> Self {
        Self::AutomationTimeout {
            control: control.into(),
            waited,
        }
    }

    /// Whether this error must stop the whole run rather than one announcement.
    ///
    /// Rejected credentials and missing boards would fail again for every
    /// remaining announcement, and a broken configuration never recovers.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::AutomationFatal(_)
                | Self::BoardNotFound(_)
                | Self::Config(_)
                | Self::Selector { .. }
        )
    }

    /// Whether this error is a bounded wait that ran out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AutomationTimeout { .. })
    }
}
