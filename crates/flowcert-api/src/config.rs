//! API configuration

use flowcert_observability::MetricsConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Webhook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Webroot holding `.well-known/acme-challenge/` tokens for HTTP-01
    #[serde(default)]
    pub webroot: Option<PathBuf>,

    /// Whether and where the Prometheus endpoint is mounted
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            webroot: None,
            metrics: MetricsConfig::default(),
        }
    }
}
