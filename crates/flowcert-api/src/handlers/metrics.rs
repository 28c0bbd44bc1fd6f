//! Prometheus exposition

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use flowcert_observability::metrics;
use std::time::Instant;

use crate::router::AppState;

/// Scrape endpoint, with the uptime gauge refreshed on every scrape
pub async fn scrape(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(m) = metrics() {
        m.set_uptime(state.started.elapsed().as_secs_f64());
    }
    flowcert_observability::metrics_handler().await
}

/// Count requests and their latency by route template
pub async fn track(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    if let Some(m) = metrics() {
        m.record_request(
            &method,
            &path,
            response.status().as_u16(),
            started.elapsed().as_secs_f64(),
        );
    }

    response
}
