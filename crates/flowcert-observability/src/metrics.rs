//! Prometheus metrics exposition

use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use tracing::info;

use crate::config::MetricsConfig;
use crate::error::{ObservabilityError, Result};

/// flowcert metrics collection
pub struct FlowcertMetrics {
    registry: Registry,

    /// Issuer runs by outcome (created, unchanged, fatal)
    pub issuance_total: CounterVec,
    /// Orchestrator secrets created
    pub secrets_created_total: Counter,
    /// Attachment list updates pushed to the proxy service
    pub attachment_pushes_total: Counter,
    /// Certificates pushed to the proxy over HTTP
    pub fallback_pushes_total: Counter,
    /// Forwarded reconfigure requests by result (delivered, exhausted)
    pub forward_total: CounterVec,

    /// Total HTTP requests by method, path, and status
    pub requests_total: CounterVec,
    /// HTTP request duration in seconds
    pub request_duration_seconds: HistogramVec,

    /// Time since the process started in seconds
    pub uptime_seconds: Gauge,
}

fn init_err(e: prometheus::Error) -> ObservabilityError {
    ObservabilityError::MetricsInit(e.to_string())
}

impl FlowcertMetrics {
    /// Create a new metrics collection with its own registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let issuance_total = CounterVec::new(
            Opts::new("flowcert_issuance_total", "Certificate issuer runs by outcome"),
            &["outcome"],
        )
        .map_err(init_err)?;

        let secrets_created_total = Counter::new(
            "flowcert_secrets_created_total",
            "Orchestrator secrets created",
        )
        .map_err(init_err)?;

        let attachment_pushes_total = Counter::new(
            "flowcert_attachment_pushes_total",
            "Secret attachment updates pushed to the proxy service",
        )
        .map_err(init_err)?;

        let fallback_pushes_total = Counter::new(
            "flowcert_fallback_pushes_total",
            "Certificates pushed to the proxy over HTTP",
        )
        .map_err(init_err)?;

        let forward_total = CounterVec::new(
            Opts::new("flowcert_forward_total", "Forwarded reconfigure requests"),
            &["result"],
        )
        .map_err(init_err)?;

        let requests_total = CounterVec::new(
            Opts::new("flowcert_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .map_err(init_err)?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "flowcert_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
            &["method", "path"],
        )
        .map_err(init_err)?;

        let uptime_seconds = Gauge::new(
            "flowcert_uptime_seconds",
            "Time since the process started in seconds",
        )
        .map_err(init_err)?;

        registry
            .register(Box::new(issuance_total.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(secrets_created_total.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(attachment_pushes_total.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(fallback_pushes_total.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(forward_total.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(requests_total.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(request_duration_seconds.clone()))
            .map_err(init_err)?;
        registry
            .register(Box::new(uptime_seconds.clone()))
            .map_err(init_err)?;

        Ok(Self {
            registry,
            issuance_total,
            secrets_created_total,
            attachment_pushes_total,
            fallback_pushes_total,
            forward_total,
            requests_total,
            request_duration_seconds,
            uptime_seconds,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| ObservabilityError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| ObservabilityError::Encode(e.to_string()))
    }

    pub fn record_issuance(&self, outcome: &str) {
        self.issuance_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_forward(&self, result: &str) {
        self.forward_total.with_label_values(&[result]).inc();
    }

    /// Record an HTTP request
    pub fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn set_uptime(&self, seconds: f64) {
        self.uptime_seconds.set(seconds);
    }
}

/// Global metrics instance
static METRICS: OnceLock<FlowcertMetrics> = OnceLock::new();

/// Initialize global metrics
///
/// Returns `None` without registering anything when metrics are disabled.
/// Later calls return the instance created by the first one.
pub fn init_metrics(config: &MetricsConfig) -> Result<Option<&'static FlowcertMetrics>> {
    if !config.enabled {
        info!("Metrics disabled by configuration");
        return Ok(None);
    }

    if let Some(existing) = METRICS.get() {
        return Ok(Some(existing));
    }

    let created = FlowcertMetrics::new()?;
    info!(path = %config.path, "Metrics registered");
    Ok(Some(METRICS.get_or_init(|| created)))
}

/// Get the global metrics instance
pub fn metrics() -> Option<&'static FlowcertMetrics> {
    METRICS.get()
}

/// Axum handler for the Prometheus metrics endpoint
#[cfg(feature = "axum")]
pub async fn metrics_handler() -> impl axum::response::IntoResponse {
    use axum::http::{header, StatusCode};

    match metrics() {
        Some(m) => match m.encode() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                body,
            ),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("Error: {e}"),
            ),
        },
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}
