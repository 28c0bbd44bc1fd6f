//! flowcert Observability - Logging and Metrics
//!
//! - Structured logging with pretty/JSON/compact formats and optional rolling files
//! - Prometheus metrics exposition
//!
//! ```no_run
//! use flowcert_observability::{init_observability, ObservabilityConfig};
//!
//! let config = ObservabilityConfig::default();
//! let _guard = init_observability(&config).expect("Failed to init observability");
//! tracing::info!("Application started");
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::*;
pub use error::{ObservabilityError, Result};
pub use logging::{init_logging, LogGuard};
pub use metrics::{init_metrics, metrics, FlowcertMetrics};

#[cfg(feature = "axum")]
pub use metrics::metrics_handler;

/// Initialize logging and metrics
///
/// Returns the logging guard, which must be held for the lifetime of the
/// application.
pub fn init_observability(config: &ObservabilityConfig) -> Result<LogGuard> {
    let log_guard = init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        level = config.logging.level.as_str(),
        format = ?config.logging.format,
        "Observability initialized"
    );

    Ok(log_guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(config.metrics.enabled);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.logging.file.is_none());
    }
}
