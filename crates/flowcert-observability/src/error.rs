//! Observability failures

use thiserror::Error;

/// Setup and exposition errors
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// The global subscriber was already set or the log file could not be opened
    #[error("logging setup failed: {0}")]
    LoggingInit(String),

    /// A collector could not be created or registered
    #[error("metric registration failed: {0}")]
    MetricsInit(String),

    /// Text exposition of the registry failed
    #[error("metric encoding failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;
