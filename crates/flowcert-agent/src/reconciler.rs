//! The reconciliation engine
//!
//! Each request is reconciled from scratch: the issuer runs first, then the
//! state of the certificate on disk, in the secret store and on the proxy
//! service is read fresh and only the missing steps are applied. Nothing is
//! cached between requests, so repeated deliveries of the same webhook
//! converge to the same end state.

use std::collections::BTreeMap;
use std::sync::Arc;

use flowcert_acme::{AcmeError, CertificateBundle, CertificateStore, IssueOutcome, Issuer};
use flowcert_core::DomainGroup;
use flowcert_observability::metrics;
use flowcert_proxy::{
    alias_for, replace_attachment, CertificateNotifier, ProxyAttachment, ProxyRegistry,
};
use flowcert_secrets::{is_stale_secret, SecretStore};
use tracing::{debug, info, instrument, warn};

use crate::error::{ReconcileError, Result};
use crate::locks::KeyedLocks;

/// Where certificates go once they are on disk
pub enum Publisher {
    /// Swarm secrets attached to the proxy service
    Orchestrator {
        secrets: Arc<dyn SecretStore>,
        registry: Arc<dyn ProxyRegistry>,
        service_name: String,
    },
    /// Raw bytes pushed to the proxy's HTTP API
    Fallback {
        notifier: Arc<dyn CertificateNotifier>,
    },
}

impl Publisher {
    pub fn kind(&self) -> &'static str {
        match self {
            Publisher::Orchestrator { .. } => "orchestrator",
            Publisher::Fallback { .. } => "fallback",
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Publisher::Orchestrator { service_name, .. } => f
                .debug_struct("Orchestrator")
                .field("service_name", service_name)
                .finish_non_exhaustive(),
            Publisher::Fallback { .. } => f.debug_struct("Fallback").finish_non_exhaustive(),
        }
    }
}

/// Outcome of one successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub per_domain: BTreeMap<String, CertificateBundle>,
    /// The issuer produced new material
    pub created: bool,
    /// The proxy service's attachment list was updated
    pub secrets_changed: bool,
}

pub struct Reconciler {
    issuer: Arc<dyn Issuer>,
    store: CertificateStore,
    publisher: Publisher,
    group_locks: KeyedLocks,
    service_locks: KeyedLocks,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(issuer: Arc<dyn Issuer>, store: CertificateStore, publisher: Publisher) -> Self {
        Self {
            issuer,
            store,
            publisher,
            group_locks: KeyedLocks::new(),
            service_locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &CertificateStore {
        &self.store
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Bring the certificate for `group` and its publication up to date
    ///
    /// `version` is the proxy API version direct pushes are sent to. Lock
    /// order is group, then proxy service.
    #[instrument(
        skip(self, email),
        fields(domains = %group, publisher = self.publisher.kind())
    )]
    pub async fn process(
        &self,
        version: u32,
        group: &DomainGroup,
        email: &str,
        testing: Option<bool>,
    ) -> Result<ReconciliationResult> {
        let _group_guard = self.group_locks.lock(group.primary()).await;

        let outcome = self.issuer.issue_or_renew(group, email, testing).await;
        if let Some(m) = metrics() {
            m.record_issuance(outcome.label());
        }

        let per_domain = match &outcome {
            IssueOutcome::Fatal(reason) => {
                return Err(ReconcileError::Issuance {
                    domains: group.to_string(),
                    reason: reason.clone(),
                })
            }
            IssueOutcome::Unchanged => self.lookup_all(group).await?,
            IssueOutcome::Created => self.store.materialize(group).await?,
        };
        let created = outcome.created();

        let secrets_changed = match &self.publisher {
            Publisher::Fallback { notifier } => {
                if created {
                    self.push_fallback(notifier.as_ref(), version, group, &per_domain)
                        .await?;
                } else {
                    debug!("Certificate unchanged, nothing to push");
                }
                false
            }
            Publisher::Orchestrator {
                secrets,
                registry,
                service_name,
            } => {
                self.sync_attachments(
                    secrets.as_ref(),
                    registry.as_ref(),
                    service_name,
                    group,
                    &per_domain,
                    created,
                )
                .await?
            }
        };

        info!(created, secrets_changed, "Reconciliation complete");
        Ok(ReconciliationResult {
            per_domain,
            created,
            secrets_changed,
        })
    }

    async fn lookup_all(&self, group: &DomainGroup) -> Result<BTreeMap<String, CertificateBundle>> {
        let mut bundles = BTreeMap::new();
        for domain in group.iter() {
            let bundle = self.store.lookup(domain).await?.ok_or_else(|| {
                warn!(
                    domain = %domain,
                    "Issuer reported no change but no certificate is on disk"
                );
                AcmeError::Consistency {
                    domain: domain.to_string(),
                    path: self.store.bundle_for(domain).combined,
                }
            })?;
            bundles.insert(domain.to_string(), bundle);
        }
        Ok(bundles)
    }

    async fn push_fallback(
        &self,
        notifier: &dyn CertificateNotifier,
        version: u32,
        group: &DomainGroup,
        per_domain: &BTreeMap<String, CertificateBundle>,
    ) -> Result<()> {
        for domain in group.iter() {
            let bundle = bundle_of(per_domain, domain)?;
            let data = self.store.read_combined(bundle).await?;
            notifier
                .push_certificate(version, &format!("{domain}.pem"), data)
                .await
                .map_err(ReconcileError::Notify)?;

            if let Some(m) = metrics() {
                m.fallback_pushes_total.inc();
            }
        }
        Ok(())
    }

    /// Returns whether the proxy service's attachment list was pushed
    async fn sync_attachments(
        &self,
        secrets: &dyn SecretStore,
        registry: &dyn ProxyRegistry,
        service_name: &str,
        group: &DomainGroup,
        per_domain: &BTreeMap<String, CertificateBundle>,
        created: bool,
    ) -> Result<bool> {
        let _service_guard = self.service_locks.lock(service_name).await;

        let (handle, mut attachments) = registry.get_attachments(service_name).await?;
        let mut changed = false;

        for domain in group.iter() {
            let alias = alias_for(domain);
            let found = secrets.find_latest(domain).await?;
            let attached = attachments.iter().any(|a| a.alias == alias);

            let (secret, fresh) = match found {
                Some(existing) if !created => (existing, false),
                _ => {
                    let data = self
                        .store
                        .read_combined(bundle_of(per_domain, domain)?)
                        .await?;
                    let secret = secrets.create(domain, &data).await?;
                    if let Some(m) = metrics() {
                        m.secrets_created_total.inc();
                    }
                    info!(domain = %domain, secret = %secret.name, "Created certificate secret");
                    (secret, true)
                }
            };

            if fresh || !attached {
                attachments = replace_attachment(
                    attachments,
                    ProxyAttachment::for_certificate(domain, &secret.id, &secret.name),
                    |name| is_stale_secret(name, domain),
                );
                changed = true;
                debug!(
                    domain = %domain,
                    alias = %alias,
                    secret = %secret.name,
                    "Attachment replaced"
                );
            } else {
                debug!(domain = %domain, "Secret already attached");
            }
        }

        if changed {
            registry.push(&handle, attachments).await?;
            if let Some(m) = metrics() {
                m.attachment_pushes_total.inc();
            }
            info!(service = %service_name, "Proxy service attachments updated");
        }

        Ok(changed)
    }
}

fn bundle_of<'a>(
    per_domain: &'a BTreeMap<String, CertificateBundle>,
    domain: &str,
) -> Result<&'a CertificateBundle> {
    per_domain.get(domain).ok_or_else(|| {
        ReconcileError::Acme(AcmeError::Consistency {
            domain: domain.to_string(),
            path: Default::default(),
        })
    })
}
