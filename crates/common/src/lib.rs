//! Shared utilities, configuration, and error handling for Lumagen
//!
//! This crate provides common functionality used across the Lumagen application:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Validated request extractors

pub mod config;
pub mod error;
pub mod extractors;

pub use config::Settings;
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
