//! flowcert Core Types
//!
//! This crate provides shared types, error handling, and configuration structures
//! used across all flowcert crates.

pub mod config;
pub mod domain;
pub mod error;

pub use config::*;
pub use domain::*;
pub use error::*;
