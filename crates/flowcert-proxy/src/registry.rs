//! Proxy service registry abstraction

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::attachment::ProxyAttachment;
use crate::error::{ProxyError, Result};

/// Identity and spec version of the proxy service as last read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub id: String,
    pub name: String,
    pub version: u64,
}

/// Reads and rewrites the proxy service's secret attachments
#[async_trait]
pub trait ProxyRegistry: Send + Sync {
    /// Resolve `service_name` to exactly one service and read its attachments
    async fn get_attachments(
        &self,
        service_name: &str,
    ) -> Result<(ServiceHandle, Vec<ProxyAttachment>)>;

    /// Replace the service's whole attachment list
    ///
    /// Fails if the service changed since `handle` was read.
    async fn push(&self, handle: &ServiceHandle, attachments: Vec<ProxyAttachment>) -> Result<()>;
}

#[derive(Debug, Clone)]
struct InMemoryService {
    id: String,
    version: u64,
    attachments: Vec<ProxyAttachment>,
}

/// In-memory registry for tests
#[derive(Debug, Default)]
pub struct InMemoryProxyRegistry {
    services: RwLock<HashMap<String, InMemoryService>>,
    pushes: AtomicUsize,
}

impl InMemoryProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service with an initial attachment list
    pub async fn add_service(&self, name: &str, attachments: Vec<ProxyAttachment>) {
        let mut services = self.services.write().await;
        let id = format!("svc-{}", services.len() + 1);
        services.insert(
            name.to_string(),
            InMemoryService {
                id,
                version: 1,
                attachments,
            },
        );
    }

    pub async fn attachments(&self, name: &str) -> Option<Vec<ProxyAttachment>> {
        self.services
            .read()
            .await
            .get(name)
            .map(|s| s.attachments.clone())
    }

    /// Simulate an out-of-band update of the service spec
    pub async fn bump_version(&self, name: &str) {
        if let Some(service) = self.services.write().await.get_mut(name) {
            service.version += 1;
        }
    }

    /// Number of successful pushes
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyRegistry for InMemoryProxyRegistry {
    async fn get_attachments(
        &self,
        service_name: &str,
    ) -> Result<(ServiceHandle, Vec<ProxyAttachment>)> {
        let services = self.services.read().await;
        let service = services
            .get(service_name)
            .ok_or_else(|| ProxyError::ServiceNotFound {
                name: service_name.to_string(),
                matches: 0,
            })?;

        Ok((
            ServiceHandle {
                id: service.id.clone(),
                name: service_name.to_string(),
                version: service.version,
            },
            service.attachments.clone(),
        ))
    }

    async fn push(&self, handle: &ServiceHandle, attachments: Vec<ProxyAttachment>) -> Result<()> {
        let mut services = self.services.write().await;
        let service = services
            .get_mut(&handle.name)
            .ok_or_else(|| ProxyError::ServiceNotFound {
                name: handle.name.clone(),
                matches: 0,
            })?;

        if service.version != handle.version {
            return Err(ProxyError::Conflict {
                name: handle.name.clone(),
                expected: handle.version,
                actual: service.version,
            });
        }

        service.attachments = attachments;
        service.version += 1;
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
