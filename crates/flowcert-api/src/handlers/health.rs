//! Health check endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::router::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    /// How certificates reach the proxy (orchestrator or fallback)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

/// Liveness check
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: None,
        publisher: None,
    })
}

/// Readiness check
pub async fn readiness(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: Some(state.started.elapsed().as_secs()),
        publisher: Some(state.reconciler.publisher().kind().to_string()),
    })
}
