//! Configuration error types.
//!
//! Codec, policy, and storage failures carry their own error enums in the
//! crates that produce them; this module only covers configuration loading
//! and the credential checks performed before outbound delivery.

use thiserror::Error;

/// Result type alias using ConfigError as the error type.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load configuration from a file or the environment
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Configuration was loaded but could not be deserialized
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// A configuration value failed validation
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Outbound delivery requested without listener credentials
    #[error("listener username/password not set")]
    MissingCredentials,
}

impl ConfigError {
    /// Creates a load failed error.
    pub fn load_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
