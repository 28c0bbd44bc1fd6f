//! Proxy registry backed by Docker Swarm services

use async_trait::async_trait;
use bollard::models::{Service, TaskSpecContainerSpecFile, TaskSpecContainerSpecSecrets};
use bollard::query_parameters::{
    InspectServiceOptions, ListServicesOptions, UpdateServiceOptions,
};
use bollard::Docker;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::attachment::ProxyAttachment;
use crate::error::{ProxyError, Result};
use crate::registry::{ProxyRegistry, ServiceHandle};

/// Swarm service registry accessed through the Docker API
pub struct DockerProxyRegistry {
    docker: Docker,
}

impl std::fmt::Debug for DockerProxyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerProxyRegistry").finish_non_exhaustive()
    }
}

impl DockerProxyRegistry {
    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

fn service_version(service: &Service) -> u64 {
    service
        .version
        .as_ref()
        .and_then(|v| v.index)
        .unwrap_or_default()
}

fn service_name(service: &Service) -> Option<&str> {
    service.spec.as_ref()?.name.as_deref()
}

fn attachments_of(service: &Service) -> Vec<ProxyAttachment> {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.task_template.as_ref())
        .and_then(|task| task.container_spec.as_ref())
        .and_then(|container| container.secrets.as_ref())
        .map(|secrets| secrets.iter().map(from_swarm).collect())
        .unwrap_or_default()
}

/// Docker mounts a secret without an explicit target at its own name, root-owned, 0444
fn from_swarm(secret: &TaskSpecContainerSpecSecrets) -> ProxyAttachment {
    let secret_name = secret.secret_name.clone().unwrap_or_default();
    let file = secret.file.as_ref();

    ProxyAttachment {
        secret_id: secret.secret_id.clone().unwrap_or_default(),
        alias: file
            .and_then(|f| f.name.clone())
            .unwrap_or_else(|| secret_name.clone()),
        uid: file.and_then(|f| f.uid.clone()).unwrap_or_else(|| "0".to_string()),
        gid: file.and_then(|f| f.gid.clone()).unwrap_or_else(|| "0".to_string()),
        mode: file.and_then(|f| f.mode).unwrap_or(0o444),
        secret_name,
    }
}

fn to_swarm(attachment: ProxyAttachment) -> TaskSpecContainerSpecSecrets {
    TaskSpecContainerSpecSecrets {
        file: Some(TaskSpecContainerSpecFile {
            name: Some(attachment.alias),
            uid: Some(attachment.uid),
            gid: Some(attachment.gid),
            mode: Some(attachment.mode),
        }),
        secret_id: Some(attachment.secret_id),
        secret_name: Some(attachment.secret_name),
    }
}

#[async_trait]
impl ProxyRegistry for DockerProxyRegistry {
    #[instrument(skip(self))]
    async fn get_attachments(
        &self,
        service_name: &str,
    ) -> Result<(ServiceHandle, Vec<ProxyAttachment>)> {
        let options = ListServicesOptions {
            filters: Some(HashMap::from([(
                "name".to_string(),
                vec![service_name.to_string()],
            )])),
            ..Default::default()
        };

        let services = self
            .docker
            .list_services(Some(options))
            .await
            .map_err(|e| ProxyError::Docker(format!("Failed to list services: {e}")))?;

        // The name filter also matches prefixes
        let mut matching: Vec<Service> = services
            .into_iter()
            .filter(|s| service_name_matches(s, service_name))
            .collect();

        if matching.len() != 1 {
            return Err(ProxyError::ServiceNotFound {
                name: service_name.to_string(),
                matches: matching.len(),
            });
        }

        let service = matching.remove(0);
        let handle = ServiceHandle {
            id: service.id.clone().unwrap_or_default(),
            name: service_name.to_string(),
            version: service_version(&service),
        };
        let attachments = attachments_of(&service);

        debug!(
            service_id = %handle.id,
            version = handle.version,
            attachments = attachments.len(),
            "Read proxy service"
        );
        Ok((handle, attachments))
    }

    #[instrument(
        skip(self, attachments),
        fields(service = %handle.name, count = attachments.len())
    )]
    async fn push(&self, handle: &ServiceHandle, attachments: Vec<ProxyAttachment>) -> Result<()> {
        let service = self
            .docker
            .inspect_service(&handle.id, None::<InspectServiceOptions>)
            .await
            .map_err(|e| ProxyError::Docker(format!("Failed to inspect service: {e}")))?;

        let current = service_version(&service);
        if current != handle.version {
            return Err(ProxyError::Conflict {
                name: handle.name.clone(),
                expected: handle.version,
                actual: current,
            });
        }

        let mut spec = service
            .spec
            .ok_or_else(|| ProxyError::Docker(format!("service {} has no spec", handle.name)))?;
        let container = spec
            .task_template
            .get_or_insert_with(Default::default)
            .container_spec
            .get_or_insert_with(Default::default);
        container.secrets = Some(attachments.into_iter().map(to_swarm).collect());

        let version = i32::try_from(handle.version).map_err(|_| {
            ProxyError::Docker(format!("service version {} out of range", handle.version))
        })?;
        let options = UpdateServiceOptions {
            version,
            ..Default::default()
        };

        let response = self
            .docker
            .update_service(&handle.id, spec, options, None)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 409, ..
                } => ProxyError::Conflict {
                    name: handle.name.clone(),
                    expected: handle.version,
                    actual: handle.version + 1,
                },
                e => ProxyError::Docker(format!("Failed to update service: {e}")),
            })?;

        for warning in response.warnings.unwrap_or_default() {
            warn!(warning = %warning, "Docker reported a warning on service update");
        }

        info!("Updated proxy service secrets");
        Ok(())
    }
}

fn service_name_matches(service: &Service, name: &str) -> bool {
    service_name(service) == Some(name)
}
