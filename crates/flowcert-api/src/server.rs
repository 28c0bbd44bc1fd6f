//! Webhook server lifecycle

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ApiConfig;
use crate::router::{build_router, AppState};

/// Router plus the address it should listen on
pub struct ApiServer {
    bind: SocketAddr,
    router: Router,
}

impl ApiServer {
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        info!(
            challenge_webroot = ?config.webroot,
            metrics = ?config.metrics.enabled.then_some(&config.metrics.path),
            "Webhook routes built"
        );
        Self {
            bind: config.bind,
            router: build_router(&config, state),
        }
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener; in-flight requests finish before return
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let local = listener.local_addr().context("Listener has no local address")?;
        info!(bind = %local, "Webhook server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Webhook server failed")?;

        info!("Webhook server shut down");
        Ok(())
    }
}
