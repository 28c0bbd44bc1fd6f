//! Proxy-side errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Zero or several services carry the requested name
    #[error("expected exactly one service named '{name}', found {matches}")]
    ServiceNotFound { name: String, matches: usize },

    /// The service changed between read and write
    #[error(
        "service '{name}' was modified concurrently (expected version {expected}, found {actual})"
    )]
    Conflict {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("Docker API error: {0}")]
    Docker(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("proxy answered {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
}

pub type Result<T, E = ProxyError> = std::result::Result<T, E>;
