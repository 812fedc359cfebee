#![forbid(unsafe_code)]

//! Runtime errors.
//!
//! Only conditions the dashboard cannot render around are errors. A failed
//! enrichment is a cache state, and an empty poll is a normal wait.

use std::io;

/// Errors that stop the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Writing to the terminal failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),

    /// A configuration value is out of range or unparsable.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl DashboardError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Standard result type for runtime operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: DashboardError = io::Error::other("pipe closed").into();
        assert_eq!(err.to_string(), "terminal write failed: pipe closed");
    }

    #[test]
    fn config_message() {
        assert_eq!(
            DashboardError::config("poll interval must be positive").to_string(),
            "invalid configuration: poll interval must be positive"
        );
    }
}
