//! flowcert API - webhook front end
//!
//! Receives docker-flow-proxy listener notifications, reconciles the
//! requested certificate and relays the notification to the proxy. Also
//! serves HTTP-01 challenge tokens, health checks and Prometheus metrics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use config::ApiConfig;
pub use error::{ApiError, ErrorResponse, Result};
pub use handlers::reconfigure::{parse_cert_request, CertRequest};
pub use router::{build_router, AppState};
pub use server::ApiServer;
