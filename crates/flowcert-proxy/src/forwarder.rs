//! Relays the original webhook to the proxy's own reconfigure endpoint

use flowcert_core::RetryPolicy;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::client::ProxyApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The proxy answered 200
    Delivered { attempts: u32 },
    /// Every attempt failed
    Exhausted { attempts: u32, last_error: String },
}

impl ForwardOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ForwardOutcome::Delivered { .. })
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            ForwardOutcome::Delivered { .. } => "delivered",
            ForwardOutcome::Exhausted { .. } => "exhausted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: Arc<ProxyApiClient>,
    policy: RetryPolicy,
}

impl RequestForwarder {
    pub fn new(client: Arc<ProxyApiClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GET `/v<version>/docker-flow-proxy/reconfigure?<raw_query>` until the
    /// proxy answers 200 or the attempts run out
    ///
    /// Failure is logged and reported, never raised.
    #[instrument(skip(self, raw_query))]
    pub async fn forward(&self, version: u32, raw_query: &str) -> ForwardOutcome {
        let attempts = self.policy.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.client.reconfigure(version, raw_query).await {
                Ok(StatusCode::OK) => {
                    info!(attempt, "Request forwarded to proxy");
                    return ForwardOutcome::Delivered { attempts: attempt };
                }
                Ok(status) => {
                    warn!(attempt, status = %status, "Proxy rejected forwarded request");
                    last_error = format!("proxy answered {status}");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Failed to reach proxy");
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        error!(attempts, last_error = %last_error, "Giving up forwarding request to proxy");
        ForwardOutcome::Exhausted {
            attempts,
            last_error,
        }
    }
}
