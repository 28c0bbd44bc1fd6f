//! Configuration structures for flowcert

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Complete companion configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompanionConfig {
    /// ACME client (certbot) configuration
    #[serde(default)]
    pub certbot: CertbotConfig,

    /// docker-flow-proxy HTTP endpoint
    #[serde(default)]
    pub proxy: ProxyEndpointConfig,

    /// Orchestrator (Docker Swarm) access
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Retry policy for forwarding webhooks to the proxy
    #[serde(default)]
    pub forward: RetryPolicy,
}

impl CompanionConfig {
    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.certbot.challenge.validate()?;

        if self.certbot.timeout.is_zero() {
            return Err(ConfigError::invalid(
                "certbot.timeout",
                "must be greater than zero",
            ));
        }

        if self.proxy.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("proxy.base_url".to_string()));
        }

        if self.forward.attempts == 0 {
            return Err(ConfigError::invalid(
                "forward.attempts",
                "at least one attempt is required",
            ));
        }

        if self.orchestrator.docker_socket_path.is_some()
            && self.orchestrator.proxy_service_name.trim().is_empty()
        {
            return Err(ConfigError::Missing(
                "orchestrator.proxy_service_name".to_string(),
            ));
        }

        Ok(())
    }
}

/// certbot invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertbotConfig {
    /// certbot executable
    #[serde(default = "default_certbot_binary")]
    pub binary: PathBuf,

    /// certbot configuration directory (holds `live/<domain>/`)
    #[serde(default = "default_certbot_path")]
    pub path: PathBuf,

    /// Challenge mechanism
    #[serde(default)]
    pub challenge: ChallengeMode,

    /// Extra command line options, whitespace separated (e.g. `--staging`)
    #[serde(default)]
    pub options: String,

    /// Wall-clock ceiling for a single certbot run
    #[serde(default = "default_certbot_timeout")]
    pub timeout: Duration,
}

fn default_certbot_binary() -> PathBuf {
    PathBuf::from("certbot")
}

fn default_certbot_path() -> PathBuf {
    PathBuf::from("/etc/letsencrypt")
}

fn default_certbot_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for CertbotConfig {
    fn default() -> Self {
        Self {
            binary: default_certbot_binary(),
            path: default_certbot_path(),
            challenge: ChallengeMode::default(),
            options: String::new(),
            timeout: default_certbot_timeout(),
        }
    }
}

/// ACME challenge mechanism used by certbot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChallengeMode {
    /// HTTP-01 through a shared webroot
    Http { webroot_path: PathBuf },

    /// DNS-01 through manual auth/cleanup hook scripts
    Dns {
        manual_auth_hook: PathBuf,
        manual_cleanup_hook: PathBuf,
    },

    /// DNS-01 through a provider-specific certbot plugin
    DnsPlugin { plugin: String, credentials: PathBuf },
}

impl Default for ChallengeMode {
    fn default() -> Self {
        ChallengeMode::Http {
            webroot_path: PathBuf::from("/opt/www"),
        }
    }
}

impl ChallengeMode {
    /// Build a challenge mode from the flat settings used by the process
    /// environment (`CERTBOT_CHALLENGE`, `CERTBOT_WEBROOT_PATH`, ...).
    ///
    /// `mode` is `http`, `dns`, or `dns-<plugin>`.
    pub fn from_parts(
        mode: &str,
        webroot_path: Option<PathBuf>,
        manual_auth_hook: Option<PathBuf>,
        manual_cleanup_hook: Option<PathBuf>,
        credentials: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mode = mode.trim().to_ascii_lowercase();
        let challenge = match mode.as_str() {
            "http" => ChallengeMode::Http {
                webroot_path: webroot_path
                    .ok_or_else(|| ConfigError::Missing("certbot webroot path".to_string()))?,
            },
            "dns" => ChallengeMode::Dns {
                manual_auth_hook: manual_auth_hook
                    .ok_or_else(|| ConfigError::Missing("certbot manual auth hook".to_string()))?,
                manual_cleanup_hook: manual_cleanup_hook.ok_or_else(|| {
                    ConfigError::Missing("certbot manual cleanup hook".to_string())
                })?,
            },
            other => match other.strip_prefix("dns-") {
                Some(plugin) => ChallengeMode::DnsPlugin {
                    plugin: plugin.to_string(),
                    credentials: credentials.ok_or_else(|| {
                        ConfigError::Missing("certbot dns credentials".to_string())
                    })?,
                },
                None => {
                    return Err(ConfigError::invalid(
                        "certbot.challenge",
                        format!("unknown challenge '{other}', expected http, dns or dns-<plugin>"),
                    ))
                }
            },
        };

        challenge.validate()?;
        Ok(challenge)
    }

    /// Short name used in logs
    pub fn name(&self) -> String {
        match self {
            ChallengeMode::Http { .. } => "http".to_string(),
            ChallengeMode::Dns { .. } => "dns".to_string(),
            ChallengeMode::DnsPlugin { plugin, .. } => format!("dns-{plugin}"),
        }
    }

    /// Webroot served for HTTP-01 challenges, if any
    pub fn webroot_path(&self) -> Option<&PathBuf> {
        match self {
            ChallengeMode::Http { webroot_path } => Some(webroot_path),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ChallengeMode::Http { webroot_path } if webroot_path.as_os_str().is_empty() => Err(
                ConfigError::Missing("certbot.challenge.webroot_path".to_string()),
            ),
            ChallengeMode::Dns {
                manual_auth_hook,
                manual_cleanup_hook,
            } if manual_auth_hook.as_os_str().is_empty()
                || manual_cleanup_hook.as_os_str().is_empty() =>
            {
                Err(ConfigError::Missing(
                    "certbot.challenge manual hooks".to_string(),
                ))
            }
            ChallengeMode::DnsPlugin {
                plugin,
                credentials,
            } => {
                let valid = |c: char| c.is_ascii_alphanumeric() || c == '-';
                if plugin.is_empty() || !plugin.chars().all(valid) {
                    return Err(ConfigError::invalid(
                        "certbot.challenge.plugin",
                        format!("invalid plugin name '{plugin}'"),
                    ));
                }
                if credentials.as_os_str().is_empty() {
                    return Err(ConfigError::Missing(
                        "certbot.challenge.credentials".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// docker-flow-proxy HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyEndpointConfig {
    /// Base URL, e.g. `http://proxy:8080`
    #[serde(default = "default_proxy_base_url")]
    pub base_url: String,

    /// Proxy API version used for certificate pushes
    #[serde(default = "default_api_version")]
    pub api_version: u32,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_proxy_base_url() -> String {
    "http://proxy:8080".to_string()
}

fn default_api_version() -> u32 {
    1
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for ProxyEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_proxy_base_url(),
            api_version: default_api_version(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ProxyEndpointConfig {
    /// Endpoint for a proxy service reachable by name on port 8080
    pub fn for_service(service_name: &str) -> Self {
        Self {
            base_url: format!("http://{service_name}:8080"),
            ..Default::default()
        }
    }
}

/// Orchestrator access
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Docker socket; when unset, certificates are pushed over HTTP instead
    #[serde(default)]
    pub docker_socket_path: Option<PathBuf>,

    /// Swarm service name of the proxy
    #[serde(default = "default_proxy_service_name")]
    pub proxy_service_name: String,

    /// Timeout for Docker API calls
    #[serde(default = "default_api_timeout")]
    pub api_timeout: Duration,
}

fn default_proxy_service_name() -> String {
    "proxy".to_string()
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(120)
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            docker_socket_path: None,
            proxy_service_name: default_proxy_service_name(),
            api_timeout: default_api_timeout(),
        }
    }
}

impl OrchestratorConfig {
    /// The orchestrator is used only when its socket is configured and present
    pub fn is_available(&self) -> bool {
        self.docker_socket_path
            .as_ref()
            .map(|path| path.exists())
            .unwrap_or(false)
    }
}

/// Fixed-interval retry policy, resolved once at startup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay between attempts
    #[serde(default = "default_interval")]
    pub interval: Duration,
}

fn default_attempts() -> u32 {
    10
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval: default_interval(),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CompanionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.forward.attempts, 10);
        assert_eq!(config.forward.interval, Duration::from_secs(5));
        assert_eq!(config.certbot.path, PathBuf::from("/etc/letsencrypt"));
    }

    #[test]
    fn test_challenge_from_parts() {
        let http = ChallengeMode::from_parts("http", Some("/opt/www".into()), None, None, None)
            .unwrap();
        assert_eq!(http.name(), "http");
        assert_eq!(http.webroot_path(), Some(&PathBuf::from("/opt/www")));

        let dns = ChallengeMode::from_parts(
            "DNS",
            None,
            Some("/hooks/auth".into()),
            Some("/hooks/cleanup".into()),
            None,
        )
        .unwrap();
        assert!(matches!(dns, ChallengeMode::Dns { .. }));

        let plugin =
            ChallengeMode::from_parts("dns-ovh", None, None, None, Some("/run/ovh.ini".into()))
                .unwrap();
        assert_eq!(plugin.name(), "dns-ovh");
    }

    #[test]
    fn test_challenge_requires_its_settings() {
        assert_eq!(
            ChallengeMode::from_parts("http", None, None, None, None).unwrap_err(),
            ConfigError::Missing("certbot webroot path".to_string())
        );
        assert!(ChallengeMode::from_parts("dns", None, Some("/a".into()), None, None).is_err());
        assert!(ChallengeMode::from_parts("dns-", None, None, None, Some("/c".into())).is_err());
        assert!(ChallengeMode::from_parts("tls-alpn", None, None, None, None).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = CompanionConfig {
            forward: RetryPolicy::new(0, Duration::from_secs(1)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key, .. }) if key == "forward.attempts"
        ));
    }

    #[test]
    fn test_challenge_serde_tagging() {
        let json = serde_json::to_value(ChallengeMode::DnsPlugin {
            plugin: "digitalocean".to_string(),
            credentials: PathBuf::from("/run/do.ini"),
        })
        .unwrap();
        assert_eq!(json["mode"], "dns_plugin");
        assert_eq!(json["plugin"], "digitalocean");
    }

    #[test]
    fn test_proxy_endpoint_for_service() {
        let endpoint = ProxyEndpointConfig::for_service("proxy_proxy");
        assert_eq!(endpoint.base_url, "http://proxy_proxy:8080");
        assert_eq!(endpoint.api_version, 1);
    }
}
