//! Certificate delivery when no orchestrator is available

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::client::ProxyApiClient;
use crate::error::Result;

/// Sends certificate bytes straight to the proxy
#[async_trait]
pub trait CertificateNotifier: Send + Sync {
    /// Push `data` as `file_name` through version `version` of the proxy API
    async fn push_certificate(&self, version: u32, file_name: &str, data: Vec<u8>) -> Result<()>;
}

/// Pushes certificates through the proxy's `/cert` endpoint
#[derive(Debug, Clone)]
pub struct FallbackNotifier {
    client: Arc<ProxyApiClient>,
}

impl FallbackNotifier {
    pub fn new(client: Arc<ProxyApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CertificateNotifier for FallbackNotifier {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn push_certificate(&self, version: u32, file_name: &str, data: Vec<u8>) -> Result<()> {
        self.client.put_certificate(version, file_name, data).await?;
        info!(cert = %file_name, "Certificate pushed to proxy");
        Ok(())
    }
}

/// A push seen by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub version: u32,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Notifier that only records what it was asked to send
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pushes: Mutex<Vec<RecordedPush>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().await.clone()
    }
}

#[async_trait]
impl CertificateNotifier for RecordingNotifier {
    async fn push_certificate(&self, version: u32, file_name: &str, data: Vec<u8>) -> Result<()> {
        self.pushes.lock().await.push(RecordedPush {
            version,
            file_name: file_name.to_string(),
            data,
        });
        Ok(())
    }
}
