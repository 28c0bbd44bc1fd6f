use anyhow::{Context, Result};
use flowcert_core::{CompanionConfig, DomainGroup};
use tracing::info;

use super::{build_proxy_client, build_reconciler};

/// Run one reconciliation for a domain group. Nothing is forwarded to the proxy.
pub(crate) async fn process(
    config: CompanionConfig,
    domains: Vec<String>,
    email: String,
    testing: Option<bool>,
) -> Result<()> {
    let group = DomainGroup::new(&domains).context("Invalid domain list")?;

    let client = build_proxy_client(&config)?;
    let reconciler = build_reconciler(&config, client)?;

    let result = reconciler
        .process(config.proxy.api_version, &group, &email, testing)
        .await
        .with_context(|| format!("Reconciliation failed for {group}"))?;

    info!(
        domains = %group,
        created = result.created,
        secrets_changed = result.secrets_changed,
        "Reconciliation complete"
    );

    for (domain, bundle) in &result.per_domain {
        println!("{domain}\t{}", bundle.combined.display());
    }

    Ok(())
}
