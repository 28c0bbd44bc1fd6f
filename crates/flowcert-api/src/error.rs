//! Webhook error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flowcert_agent::ReconcileError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Failures a webhook request can end in
#[derive(Debug, Error)]
pub enum ApiError {
    /// The path segment before `docker-flow-proxy-letsencrypt` is not `v<N>`
    #[error("Not found: {0}")]
    NotFound(String),

    /// Issuance or publication failed after the request was forwarded
    #[error("Certificate reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Reconcile(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `error` field of the response body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Reconcile(_) => "reconcile_failed",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Reconcile(ReconcileError::Issuance { domains, .. }) => {
                Some(json!({ "domains": domains }))
            }
            _ => None,
        }
    }
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
