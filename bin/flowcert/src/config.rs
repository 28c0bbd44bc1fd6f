//! Resolve command line and environment settings into typed configuration

use std::time::Duration;

use flowcert_core::{
    CertbotConfig, ChallengeMode, CompanionConfig, ConfigError, OrchestratorConfig,
    ProxyEndpointConfig, RetryPolicy,
};
use flowcert_observability::{
    LogFormat, LogLevel, LoggingConfig, MetricsConfig, ObservabilityConfig,
};

use crate::cli::Settings;

/// Build and validate the companion configuration
pub(crate) fn build_companion_config(settings: &Settings) -> Result<CompanionConfig, ConfigError> {
    let challenge = ChallengeMode::from_parts(
        &settings.certbot_challenge,
        Some(settings.certbot_webroot_path.clone()),
        settings.certbot_manual_auth_hook.clone(),
        settings.certbot_manual_cleanup_hook.clone(),
        settings.certbot_dns_credentials.clone(),
    )?;

    let mut proxy = ProxyEndpointConfig::for_service(&settings.proxy_service_name);
    if let Some(url) = &settings.proxy_url {
        proxy.base_url = url.trim_end_matches('/').to_string();
    }

    let config = CompanionConfig {
        certbot: CertbotConfig {
            binary: settings.certbot_binary.clone(),
            path: settings.certbot_path.clone(),
            challenge,
            options: settings.certbot_options.clone().unwrap_or_default(),
            timeout: Duration::from_secs(settings.certbot_timeout),
        },
        proxy,
        orchestrator: OrchestratorConfig {
            docker_socket_path: settings.docker_socket_path.clone(),
            proxy_service_name: settings.proxy_service_name.clone(),
            ..Default::default()
        },
        forward: RetryPolicy::new(settings.retry, Duration::from_secs(settings.retry_interval)),
    };

    config.validate()?;
    Ok(config)
}

/// Metrics endpoint settings. The path must not shadow another route.
pub(crate) fn build_metrics_config(
    path: &str,
    disabled: bool,
) -> Result<MetricsConfig, ConfigError> {
    const KEY: &str = "metrics_path";
    const RESERVED: [&str; 2] = ["/health", "/.well-known"];

    if !disabled {
        if !path.starts_with('/') || path.len() < 2 {
            return Err(ConfigError::invalid(KEY, "must start with / and name a route"));
        }
        if path.contains(['{', '}', '*']) {
            return Err(ConfigError::invalid(KEY, "must not contain route parameters"));
        }
        if RESERVED.iter().any(|r| path == *r || path.starts_with(&format!("{r}/"))) {
            return Err(ConfigError::invalid(KEY, format!("{path} is already routed")));
        }
    }

    Ok(MetricsConfig {
        enabled: !disabled,
        path: path.to_string(),
    })
}

/// Logging setup: `-v` lowers the base level one step per flag
pub(crate) fn build_observability_config(
    level: LogLevel,
    verbose: u8,
    format: LogFormat,
    metrics: MetricsConfig,
) -> ObservabilityConfig {
    ObservabilityConfig {
        logging: LoggingConfig {
            level: level.more_verbose(verbose),
            format,
            ..Default::default()
        },
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["flowcert"];
        argv.extend_from_slice(args);
        argv.push("check-config");
        Cli::try_parse_from(argv).unwrap().settings
    }

    #[test]
    fn test_defaults_resolve_to_http_mode() {
        let config = build_companion_config(&settings(&["--proxy-service-name", "proxy"])).unwrap();
        assert_eq!(config.certbot.challenge.name(), "http");
        assert_eq!(config.proxy.base_url, "http://proxy:8080");
        assert_eq!(config.forward.attempts, 10);
        assert_eq!(config.forward.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_dns_mode_requires_hooks() {
        let err = build_companion_config(&settings(&["--certbot-challenge", "dns"])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));

        let config = build_companion_config(&settings(&[
            "--certbot-challenge",
            "dns",
            "--certbot-manual-auth-hook",
            "/hooks/auth.sh",
            "--certbot-manual-cleanup-hook",
            "/hooks/cleanup.sh",
        ]))
        .unwrap();
        assert_eq!(config.certbot.challenge.name(), "dns");
    }

    #[test]
    fn test_zero_retry_rejected() {
        assert!(build_companion_config(&settings(&["--retry", "0"])).is_err());
    }

    #[test]
    fn test_proxy_url_override() {
        let config =
            build_companion_config(&settings(&["--proxy-url", "http://127.0.0.1:9000/"])).unwrap();
        assert_eq!(config.proxy.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_verbosity_lowers_level() {
        let config = build_observability_config(
            LogLevel::Info,
            1,
            LogFormat::Json,
            MetricsConfig::default(),
        );
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_metrics_path_validation() {
        let metrics = build_metrics_config("/internal/metrics", false).unwrap();
        assert!(metrics.enabled);
        assert_eq!(metrics.path, "/internal/metrics");

        assert!(build_metrics_config("metrics", false).is_err());
        assert!(build_metrics_config("/", false).is_err());
        assert!(build_metrics_config("/health/live", false).is_err());
        assert!(build_metrics_config("/{version}", false).is_err());
        assert!(build_metrics_config("/healthz", false).is_ok());
    }

    #[test]
    fn test_disabled_metrics_skip_path_checks() {
        let metrics = build_metrics_config("", true).unwrap();
        assert!(!metrics.enabled);
    }
}
