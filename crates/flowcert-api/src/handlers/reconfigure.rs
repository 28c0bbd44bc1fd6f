//! Webhook relayed by docker-flow-proxy's listener on service create/update
//!
//! Certificate intent is read from the service labels the listener passes
//! through as query parameters:
//!
//! - `letsencrypt.email` (required for any certificate work)
//! - `letsencrypt.host` (comma separated), or every `serviceDomain*` parameter
//! - `letsencrypt.testing` (`true` selects the ACME staging environment)

use axum::extract::{Path, Query, RawQuery, State};
use flowcert_agent::ReconcileError;
use flowcert_core::{DomainError, DomainGroup};
use flowcert_observability::metrics;
use tracing::{error, info, instrument, warn};

use crate::error::{ApiError, Result};
use crate::router::AppState;

/// Proxy API version this companion understands
pub const SUPPORTED_VERSION: u32 = 1;

const EMAIL_KEY: &str = "letsencrypt.email";
const HOST_KEY: &str = "letsencrypt.host";
const TESTING_KEY: &str = "letsencrypt.testing";
const SERVICE_DOMAIN_PREFIX: &str = "serviceDomain";

/// A certificate request extracted from webhook parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRequest {
    pub domains: DomainGroup,
    pub email: String,
    pub testing: Option<bool>,
}

/// Read certificate intent from decoded query pairs
///
/// Returns `Ok(None)` when no email is given, meaning the service does not
/// ask for a certificate.
pub fn parse_cert_request(
    pairs: &[(String, String)],
) -> std::result::Result<Option<CertRequest>, DomainError> {
    let lookup = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

    let Some(email) = lookup(EMAIL_KEY).map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };

    let domains = match lookup(HOST_KEY) {
        Some(hosts) => DomainGroup::parse_list(hosts)?,
        None => DomainGroup::new(
            pairs
                .iter()
                .filter(|(k, _)| k.starts_with(SERVICE_DOMAIN_PREFIX))
                .flat_map(|(_, v)| v.split(',')),
        )?,
    };

    let testing = lookup(TESTING_KEY).map(|v| v.trim().eq_ignore_ascii_case("true"));

    Ok(Some(CertRequest {
        domains,
        email: email.to_string(),
        testing,
    }))
}

/// `v<integer>` path segment
pub fn parse_version(segment: &str) -> Option<u32> {
    segment.strip_prefix('v')?.parse().ok()
}

/// `GET /{version}/docker-flow-proxy-letsencrypt/reconfigure`
///
/// Reconciles the certificate (when asked for and supported), then always
/// forwards the request to the proxy. The reconciliation result decides the
/// status code; forwarding failures never do.
#[instrument(skip(state, pairs, raw_query))]
pub async fn reconfigure(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    RawQuery(raw_query): RawQuery,
) -> Result<&'static str> {
    let version = parse_version(&version)
        .ok_or_else(|| ApiError::NotFound(format!("unknown API version '{version}'")))?;

    let reconciled = if version != SUPPORTED_VERSION {
        error!(version, "Unsupported proxy API version, skipping certificate handling");
        Ok(())
    } else {
        match parse_cert_request(&pairs) {
            Ok(Some(request)) => process(&state, version, request).await,
            Ok(None) => Ok(()),
            Err(DomainError::Empty) => {
                warn!("letsencrypt.email is set but no domains were given");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Ignoring certificate request with invalid domains");
                Ok(())
            }
        }
    };

    let outcome = state
        .forwarder
        .forward(version, raw_query.as_deref().unwrap_or_default())
        .await;
    if let Some(m) = metrics() {
        m.record_forward(outcome.label());
    }

    reconciled?;
    Ok("OK")
}

async fn process(
    state: &AppState,
    version: u32,
    request: CertRequest,
) -> std::result::Result<(), ReconcileError> {
    info!(
        domains = %request.domains,
        testing = ?request.testing,
        "Certificate requested"
    );

    match state
        .reconciler
        .process(version, &request.domains, &request.email, request.testing)
        .await
    {
        Ok(result) => {
            info!(
                domains = %request.domains,
                created = result.created,
                secrets_changed = result.secrets_changed,
                "Certificate request handled"
            );
            Ok(())
        }
        Err(e) => {
            error!(domains = %request.domains, error = %e, "Certificate request failed");
            Err(e)
        }
    }
}
