use serde::{Deserialize, Serialize};

/// A secret in the orchestrator's store
///
/// Secrets are immutable; a renewed certificate always gets a new secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretHandle {
    pub id: String,
    pub name: String,
}

impl SecretHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
