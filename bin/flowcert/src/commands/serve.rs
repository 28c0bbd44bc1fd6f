use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use flowcert_api::{ApiConfig, ApiServer, AppState};
use flowcert_core::CompanionConfig;
use flowcert_observability::MetricsConfig;
use flowcert_proxy::RequestForwarder;
use tracing::{info, warn};

use super::{build_proxy_client, build_reconciler};

/// Start the webhook server
pub(crate) async fn serve(
    config: CompanionConfig,
    bind: SocketAddr,
    no_challenge_route: bool,
    metrics: MetricsConfig,
) -> Result<()> {
    let client = build_proxy_client(&config)?;
    let reconciler = Arc::new(build_reconciler(&config, client.clone())?);
    let forwarder = Arc::new(RequestForwarder::new(client, config.forward));

    let webroot = if no_challenge_route {
        None
    } else {
        config.certbot.challenge.webroot_path().cloned()
    };

    let api_config = ApiConfig {
        bind,
        webroot,
        metrics,
    };

    info!(
        bind = %api_config.bind,
        challenge = %config.certbot.challenge.name(),
        publisher = reconciler.publisher().kind(),
        metrics = ?api_config.metrics.enabled.then_some(&api_config.metrics.path),
        retry_attempts = config.forward.attempts,
        retry_interval_secs = config.forward.interval.as_secs(),
        "Starting flowcert"
    );

    let server = ApiServer::new(api_config, AppState::new(reconciler, forwarder));
    server.run_with_shutdown(shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
