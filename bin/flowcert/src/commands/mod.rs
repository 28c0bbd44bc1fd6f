pub mod check_config;
pub mod process;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use bollard::Docker;
use flowcert_acme::{CertbotIssuer, CertificateStore};
use flowcert_agent::{Publisher, Reconciler};
use flowcert_core::CompanionConfig;
use flowcert_proxy::{DockerProxyRegistry, FallbackNotifier, ProxyApiClient};
use flowcert_secrets::DockerSecretStore;
use tracing::info;

/// Wire the reconciliation engine for the resolved configuration.
///
/// Swarm secrets are used when the Docker socket exists, the proxy HTTP API
/// otherwise.
pub(crate) fn build_reconciler(
    config: &CompanionConfig,
    client: Arc<ProxyApiClient>,
) -> Result<Reconciler> {
    let issuer = Arc::new(CertbotIssuer::new(&config.certbot));
    let store = CertificateStore::new(config.certbot.path.clone());

    let publisher = match config.orchestrator.docker_socket_path.as_ref() {
        Some(socket) if config.orchestrator.is_available() => {
            let socket = socket.to_string_lossy();
            let docker = Docker::connect_with_unix(
                &socket,
                config.orchestrator.api_timeout.as_secs(),
                bollard::API_DEFAULT_VERSION,
            )
            .with_context(|| format!("Failed to connect to Docker at {socket}"))?;

            info!(
                socket = %socket,
                service = %config.orchestrator.proxy_service_name,
                "Publishing certificates as swarm secrets"
            );

            Publisher::Orchestrator {
                secrets: Arc::new(DockerSecretStore::with_client(docker.clone())),
                registry: Arc::new(DockerProxyRegistry::with_client(docker)),
                service_name: config.orchestrator.proxy_service_name.clone(),
            }
        }
        _ => {
            info!(
                proxy = %config.proxy.base_url,
                "Docker socket not available, pushing certificates to the proxy API"
            );
            Publisher::Fallback {
                notifier: Arc::new(FallbackNotifier::new(client)),
            }
        }
    };

    Ok(Reconciler::new(issuer, store, publisher))
}

/// Shared HTTP client for the proxy API
pub(crate) fn build_proxy_client(config: &CompanionConfig) -> Result<Arc<ProxyApiClient>> {
    let client = ProxyApiClient::new(&config.proxy).context("Failed to build proxy HTTP client")?;
    Ok(Arc::new(client))
}
