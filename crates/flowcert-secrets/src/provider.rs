//! Secret store abstraction

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::naming::{new_secret_name, owned_by};
use crate::{Result, SecretHandle, SecretsError};

/// Orchestrator-managed secret storage for certificates
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Newest secret whose name belongs to `domain`
    async fn find_latest(&self, domain: &str) -> Result<Option<SecretHandle>>;

    /// Whether any secret for `domain` exists
    async fn exists_for(&self, domain: &str) -> Result<bool> {
        Ok(self.find_latest(domain).await?.is_some())
    }

    /// Create a new secret holding `data`, named after `domain`
    async fn create(&self, domain: &str, data: &[u8]) -> Result<SecretHandle>;
}

/// Pick the newest candidate belonging to `domain`
///
/// Candidates are secrets paired with the domain label they were created
/// with, if any. Ownership follows [`owned_by`].
pub fn latest_for<I>(domain: &str, candidates: I) -> Option<SecretHandle>
where
    I: IntoIterator<Item = (SecretHandle, Option<String>)>,
{
    candidates
        .into_iter()
        .filter_map(|(handle, label)| {
            owned_by(&handle.name, label.as_deref(), domain).map(|created| (created, handle))
        })
        .max_by(|(a, ha), (b, hb)| a.cmp(b).then_with(|| ha.name.cmp(&hb.name)))
        .map(|(_, handle)| handle)
}

#[derive(Debug, Clone)]
struct StoredSecret {
    handle: SecretHandle,
    label: Option<String>,
    data: Vec<u8>,
}

/// In-memory secret store
///
/// Creation timestamps never repeat: each new secret is stamped at least one
/// second after the previous one.
#[derive(Debug)]
pub struct InMemorySecretStore {
    secrets: RwLock<Vec<StoredSecret>>,
    last_stamp: RwLock<Option<DateTime<Utc>>>,
    next_id: AtomicU64,
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(Vec::new()),
            last_stamp: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed an existing secret that carries no domain label
    pub async fn insert(&self, handle: SecretHandle, data: impl Into<Vec<u8>>) {
        self.secrets.write().await.push(StoredSecret {
            handle,
            label: None,
            data: data.into(),
        });
    }

    /// All secrets, in creation order
    pub async fn secrets(&self) -> Vec<SecretHandle> {
        self.secrets
            .read()
            .await
            .iter()
            .map(|s| s.handle.clone())
            .collect()
    }

    pub async fn data(&self, name: &str) -> Option<Vec<u8>> {
        self.secrets
            .read()
            .await
            .iter()
            .find(|s| s.handle.name == name)
            .map(|s| s.data.clone())
    }

    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }

    async fn next_stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.write().await;
        let now = Utc::now();
        let stamp = match *last {
            Some(prev) if now < prev + Duration::seconds(1) => prev + Duration::seconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn find_latest(&self, domain: &str) -> Result<Option<SecretHandle>> {
        let secrets = self.secrets.read().await;
        Ok(latest_for(
            domain,
            secrets
                .iter()
                .map(|s| (s.handle.clone(), s.label.clone())),
        ))
    }

    async fn create(&self, domain: &str, data: &[u8]) -> Result<SecretHandle> {
        let name = new_secret_name(domain, self.next_stamp().await);

        let mut secrets = self.secrets.write().await;
        if secrets.iter().any(|s| s.handle.name == name) {
            return Err(SecretsError::AlreadyExists { name });
        }

        let id = format!("secret-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let handle = SecretHandle::new(id, name);
        secrets.push(StoredSecret {
            handle: handle.clone(),
            label: Some(domain.to_string()),
            data: data.to_vec(),
        });

        debug!(domain = %domain, secret = %handle.name, "Created in-memory secret");
        Ok(handle)
    }
}
