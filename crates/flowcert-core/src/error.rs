//! Core error types for flowcert
//!
//! Errors shared by every crate: configuration problems detected at startup and
//! invalid domain groups built from webhook input.

use thiserror::Error;

/// Global flowcert error type
#[derive(Debug, Error)]
pub enum FlowcertError {
    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Domain group errors
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Missing required configuration
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// Invalid configuration value
    #[error("invalid configuration for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    /// Shorthand for an invalid-value error
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors building a [`crate::DomainGroup`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// No usable host name was supplied
    #[error("domain group is empty")]
    Empty,

    /// A host name contains characters that cannot appear in a file name
    #[error("invalid host name '{0}'")]
    InvalidHost(String),
}

/// Result type alias for flowcert operations
pub type Result<T, E = FlowcertError> = std::result::Result<T, E>;
