use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use flowcert_observability::{LogFormat, LogLevel};

/// Let's Encrypt companion for docker-flow-proxy
#[derive(Parser)]
#[command(name = "flowcert")]
#[command(version, about = "Let's Encrypt companion for docker-flow-proxy")]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Log output format
    #[arg(long, default_value = "pretty", global = true)]
    pub(crate) log_format: LogFormat,

    /// Base log level (trace, debug, info, warning, error, critical)
    #[arg(long, env = "LOG", default_value = "info", global = true)]
    pub(crate) log: LogLevel,

    /// Path of the Prometheus endpoint
    #[arg(long, env = "FLOWCERT_METRICS_PATH", default_value = "/metrics", global = true)]
    pub(crate) metrics_path: String,

    /// Do not register or serve Prometheus metrics
    #[arg(long, global = true)]
    pub(crate) no_metrics: bool,

    #[command(flatten)]
    pub(crate) settings: Settings,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Settings shared by every subcommand, resolved once at startup
#[derive(Debug, Clone, Args)]
pub(crate) struct Settings {
    /// certbot executable
    #[arg(long, env = "CERTBOT_BINARY", default_value = "certbot", global = true)]
    pub(crate) certbot_binary: PathBuf,

    /// certbot configuration directory (holds live/ and archive/)
    #[arg(long, env = "CERTBOT_PATH", default_value = "/etc/letsencrypt", global = true)]
    pub(crate) certbot_path: PathBuf,

    /// Challenge type: http, dns or dns-<plugin>
    #[arg(long, env = "CERTBOT_CHALLENGE", default_value = "http", global = true)]
    pub(crate) certbot_challenge: String,

    /// Webroot for HTTP-01 challenges
    #[arg(long, env = "CERTBOT_WEBROOT_PATH", default_value = "/opt/www", global = true)]
    pub(crate) certbot_webroot_path: PathBuf,

    /// Extra certbot arguments, whitespace separated
    #[arg(long, env = "CERTBOT_OPTIONS", global = true)]
    pub(crate) certbot_options: Option<String>,

    #[arg(long, env = "CERTBOT_MANUAL_AUTH_HOOK", global = true)]
    pub(crate) certbot_manual_auth_hook: Option<PathBuf>,

    #[arg(long, env = "CERTBOT_MANUAL_CLEANUP_HOOK", global = true)]
    pub(crate) certbot_manual_cleanup_hook: Option<PathBuf>,

    /// Credentials file for dns-<plugin> challenges
    #[arg(long, env = "CERTBOT_DNS_CREDENTIALS", global = true)]
    pub(crate) certbot_dns_credentials: Option<PathBuf>,

    /// Wall-clock limit for one certbot run, in seconds
    #[arg(long, env = "CERTBOT_TIMEOUT", default_value_t = 300, global = true)]
    pub(crate) certbot_timeout: u64,

    /// Docker socket; secrets mode is used when it exists
    #[arg(long, env = "DOCKER_SOCKET_PATH", global = true)]
    pub(crate) docker_socket_path: Option<PathBuf>,

    /// Name of the proxy service
    #[arg(long, env = "DF_PROXY_SERVICE_NAME", default_value = "proxy", global = true)]
    pub(crate) proxy_service_name: String,

    /// Proxy API base URL (defaults to http://<proxy service>:8080)
    #[arg(long, env = "DF_PROXY_URL", global = true)]
    pub(crate) proxy_url: Option<String>,

    /// Forwarding attempts before giving up
    #[arg(long, env = "RETRY", default_value_t = 10, global = true)]
    pub(crate) retry: u32,

    /// Seconds between forwarding attempts
    #[arg(long, env = "RETRY_INTERVAL", default_value_t = 5, global = true)]
    pub(crate) retry_interval: u64,
}

/// CLI subcommands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start the webhook server
    Serve {
        /// Bind address (e.g., 0.0.0.0:8080)
        #[arg(long, env = "FLOWCERT_BIND", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Do not serve the HTTP-01 challenge directory
        #[arg(long)]
        no_challenge_route: bool,
    },

    /// Issue or renew one certificate and publish it, without forwarding
    Process {
        /// Domain to include; the first one is the primary
        #[arg(short, long = "domain", required = true)]
        domains: Vec<String>,

        /// ACME account email
        #[arg(short, long)]
        email: String,

        /// Use the staging environment (true) or production (false)
        #[arg(long)]
        testing: Option<bool>,
    },

    /// Validate and print the resolved configuration
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "flowcert",
            "process",
            "-d",
            "example.com",
            "--domain",
            "www.example.com",
            "--email",
            "ops@example.com",
            "--testing",
            "true",
        ])
        .unwrap();

        match cli.command {
            Commands::Process {
                domains,
                email,
                testing,
            } => {
                assert_eq!(domains, vec!["example.com", "www.example.com"]);
                assert_eq!(email, "ops@example.com");
                assert_eq!(testing, Some(true));
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_process_requires_domain() {
        assert!(Cli::try_parse_from(["flowcert", "process", "--email", "a@b.c"]).is_err());
    }

    #[test]
    fn test_log_level_accepts_aliases() {
        let cli = Cli::try_parse_from(["flowcert", "--log", "warning", "check-config"]).unwrap();
        assert_eq!(cli.log, LogLevel::Warn);
        assert!(Cli::try_parse_from(["flowcert", "--log", "loud", "check-config"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "flowcert",
            "serve",
            "-vv",
            "--log-format",
            "json",
            "--retry",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.settings.retry, 3);
        assert!(matches!(cli.command, Commands::Serve { .. }));
    }

    #[test]
    fn test_metrics_flags() {
        let cli = Cli::try_parse_from(["flowcert", "serve"]).unwrap();
        assert_eq!(cli.metrics_path, "/metrics");
        assert!(!cli.no_metrics);

        let cli = Cli::try_parse_from([
            "flowcert",
            "serve",
            "--metrics-path",
            "/internal/metrics",
            "--no-metrics",
        ])
        .unwrap();
        assert_eq!(cli.metrics_path, "/internal/metrics");
        assert!(cli.no_metrics);
    }
}
