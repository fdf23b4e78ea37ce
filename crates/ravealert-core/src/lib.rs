//! # RaveAlert Core
//!
//! Configuration and logging for the RaveAlert CAP gateway.
//!
//! This crate provides the pieces shared by the listener and the sender:
//!
//! - **Configuration**: [`AppConfig`] loaded from YAML with `RAVE_`
//!   environment variable overrides, passed explicitly into the services.
//! - **Errors**: [`ConfigError`] for configuration and credential failures.
//! - **Logging**: tracing subscriber setup driven by the configuration.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types for convenience
pub use config::{AppConfig, ListenerConfig, LoggingConfig, OutboundConfig, StorageConfig};
pub use error::{ConfigError, Result};
pub use logging::init_logging;
