//! docker-flow-proxy integration
//!
//! - [`registry`]: the proxy service's secret attachments (Docker Swarm or in-memory)
//! - [`notifier`]: direct certificate upload when no orchestrator is reachable
//! - [`forwarder`]: relays webhooks to the proxy's reconfigure endpoint

pub mod attachment;
pub mod client;
pub mod error;
pub mod forwarder;
pub mod notifier;
pub mod registry;

#[cfg(feature = "docker")]
pub mod docker;

pub use attachment::{alias_for, replace_attachment, ProxyAttachment, CERT_ALIAS_PREFIX};
pub use client::ProxyApiClient;
pub use error::{ProxyError, Result};
pub use forwarder::{ForwardOutcome, RequestForwarder};
pub use notifier::{CertificateNotifier, FallbackNotifier, RecordedPush, RecordingNotifier};
pub use registry::{InMemoryProxyRegistry, ProxyRegistry, ServiceHandle};

#[cfg(feature = "docker")]
pub use docker::DockerProxyRegistry;
