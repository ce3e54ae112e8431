//! Error types for the brand-insights-rust library.
//!
//! This module provides custom error types using `thiserror` so every failure
//! the dashboard can surface maps onto one user-visible category.

use thiserror::Error;

/// Errors that can occur in the brand-insights-rust application.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// The record store could not be opened, queried, or answered in time
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store answered but holds no records for the account
    #[error("No business details found for {0}")]
    NoRecordsFound(String),

    /// Submitted password did not match the selected account
    #[error("Invalid username or password")]
    AuthenticationFailed,

    /// Chart or document generation failed
    #[error("Report rendering failed: {0}")]
    Render(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// User input rejected before reaching the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session action not allowed from the current state
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV import errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with InsightsError
pub type Result<T> = std::result::Result<T, InsightsError>;

impl From<rusqlite::Error> for InsightsError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<r2d2::Error> for InsightsError {
    fn from(err: r2d2::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<anyhow::Error> for InsightsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl InsightsError {
    /// True for failures that end the current view rather than being shown inline.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::NoRecordsFound(_) | Self::AuthenticationFailed | Self::InvalidInput(_)
        )
    }
}
