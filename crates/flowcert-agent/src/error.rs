//! Reconciliation errors

use flowcert_acme::AcmeError;
use flowcert_proxy::ProxyError;
use flowcert_secrets::SecretsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The issuer reported a fatal outcome
    #[error("issuance failed for {domains}: {reason}")]
    Issuance { domains: String, reason: String },

    /// Certificate material on disk is missing or unreadable
    #[error(transparent)]
    Acme(#[from] AcmeError),

    #[error("secret store error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("proxy registry error: {0}")]
    Proxy(#[from] ProxyError),

    /// Direct certificate push to the proxy failed
    #[error("certificate push failed: {0}")]
    Notify(#[source] ProxyError),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
