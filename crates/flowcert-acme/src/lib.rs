//! Certificate issuance and on-disk certificate material for flowcert

pub mod error;
pub mod issuer;
pub mod store;

pub use error::{AcmeError, Result};
pub use issuer::{classify, CertbotIssuer, CommandOutput, IssueOutcome, Issuer, MockIssuer};
pub use store::{CertificateBundle, CertificateStore};
