//! Certificate store errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcmeError {
    /// On-disk state contradicts what the issuer reported
    #[error("certificate material for '{domain}' is missing: {path}")]
    Consistency { domain: String, path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AcmeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AcmeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = AcmeError> = std::result::Result<T, E>;
