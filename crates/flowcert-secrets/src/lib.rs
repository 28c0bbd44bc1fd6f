//! Orchestrator secret storage for flowcert certificates
//!
//! Each issued certificate is stored as an immutable secret named after its
//! domain plus a creation timestamp (see [`naming`]). Renewal never updates a
//! secret in place; it creates a new one and the proxy's attachment is
//! switched over.

mod error;
pub mod naming;
pub mod provider;
mod types;

#[cfg(feature = "docker")]
pub mod docker;

pub use error::{Result, SecretsError};
pub use naming::{
    is_stale_secret, name_identifies_domain, new_secret_name, owned_by, secret_name_prefix,
    MAX_SECRET_NAME_LEN,
};
pub use provider::{latest_for, InMemorySecretStore, SecretStore};
pub use types::SecretHandle;

#[cfg(feature = "docker")]
pub use docker::DockerSecretStore;
