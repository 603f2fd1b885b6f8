//! Observability error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObservabilityError {
    /// A global subscriber was already installed, or the filter was invalid.
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    #[error("Unknown log format: {0} (expected 'human' or 'json')")]
    InvalidFormat(String),

    #[error("Unknown log level: {0}")]
    InvalidLevel(String),
}
