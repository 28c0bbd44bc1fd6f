//! API router construction

use axum::{middleware, routing::get, Router};
use flowcert_agent::Reconciler;
use flowcert_proxy::RequestForwarder;
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub forwarder: Arc<RequestForwarder>,
    pub started: Instant,
}

impl AppState {
    pub fn new(reconciler: Arc<Reconciler>, forwarder: Arc<RequestForwarder>) -> Self {
        Self {
            reconciler,
            forwarder,
            started: Instant::now(),
        }
    }
}

/// Build the API router
pub fn build_router(config: &ApiConfig, state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(handlers::health::liveness))
        .route("/ready", get(handlers::health::readiness));

    let mut router = Router::new()
        .route(
            "/{version}/docker-flow-proxy-letsencrypt/reconfigure",
            get(handlers::reconfigure::reconfigure),
        )
        .nest("/health", health_routes);

    if config.metrics.enabled {
        router = router.route(&config.metrics.path, get(handlers::metrics::scrape));
    }

    router = router.route_layer(middleware::from_fn(handlers::metrics::track));

    if let Some(webroot) = &config.webroot {
        router = router.nest_service(
            "/.well-known/acme-challenge",
            ServeDir::new(webroot.join(".well-known").join("acme-challenge")),
        );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
