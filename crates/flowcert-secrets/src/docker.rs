//! Docker Swarm secret store using bollard

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bollard::models::SecretSpec;
use bollard::query_parameters::ListSecretsOptions;
use bollard::Docker;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::naming::{new_secret_name, secret_name_prefix};
use crate::provider::{latest_for, SecretStore};
use crate::{Result, SecretHandle, SecretsError};

/// Label set on every secret this store creates
pub const DOMAIN_LABEL: &str = "flowcert.domain";

/// Swarm secrets accessed through the Docker API
pub struct DockerSecretStore {
    docker: Docker,
}

impl std::fmt::Debug for DockerSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerSecretStore").finish_non_exhaustive()
    }
}

impl DockerSecretStore {
    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl SecretStore for DockerSecretStore {
    #[instrument(skip(self))]
    async fn find_latest(&self, domain: &str) -> Result<Option<SecretHandle>> {
        // The daemon's name filter is a substring match. Ownership is decided
        // by latest_for from the name and the domain label.
        let options = ListSecretsOptions {
            filters: Some(HashMap::from([(
                "name".to_string(),
                vec![secret_name_prefix(domain)],
            )])),
            ..Default::default()
        };

        let secrets = self
            .docker
            .list_secrets(Some(options))
            .await
            .map_err(|e| SecretsError::Orchestrator(format!("Failed to list secrets: {e}")))?;

        let candidates = secrets.into_iter().filter_map(|secret| {
            let spec = secret.spec?;
            let label = spec
                .labels
                .and_then(|mut labels| labels.remove(DOMAIN_LABEL));
            Some((SecretHandle::new(secret.id?, spec.name?), label))
        });

        let latest = latest_for(domain, candidates);
        debug!(found = latest.is_some(), "Looked up certificate secret");
        Ok(latest)
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn create(&self, domain: &str, data: &[u8]) -> Result<SecretHandle> {
        let name = new_secret_name(domain, Utc::now());

        let spec = SecretSpec {
            name: Some(name.clone()),
            labels: Some(HashMap::from([(
                DOMAIN_LABEL.to_string(),
                domain.to_string(),
            )])),
            data: Some(STANDARD.encode(data)),
            ..Default::default()
        };

        let response = self.docker.create_secret(spec).await.map_err(|e| match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            } => SecretsError::AlreadyExists { name: name.clone() },
            e => SecretsError::Orchestrator(format!("Failed to create secret {name}: {e}")),
        })?;

        info!(secret = %name, id = %response.id, "Created certificate secret");
        Ok(SecretHandle::new(response.id, name))
    }
}
