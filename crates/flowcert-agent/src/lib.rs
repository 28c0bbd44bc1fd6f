//! flowcert Agent - certificate reconciliation
//!
//! [`Reconciler`] drives one webhook request to completion: issue or renew,
//! materialize on disk, then publish either as orchestrator secrets attached
//! to the proxy service or by pushing the bytes to the proxy directly.

pub mod error;
pub mod locks;
pub mod reconciler;

pub use error::{ReconcileError, Result};
pub use locks::KeyedLocks;
pub use reconciler::{Publisher, Reconciler, ReconciliationResult};
