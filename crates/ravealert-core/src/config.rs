//! Configuration management for the RaveAlert CAP gateway.
//!
//! Settings are loaded from an optional YAML file and overridden by
//! `RAVE_`-prefixed environment variables (`RAVE_LISTENER__PORT=8080`,
//! `RAVE_OUTBOUND__USERNAME=ops`, ...). The resulting [`AppConfig`] is an
//! explicit value passed into the listener and the sender; nothing in the
//! workspace reads configuration through a global.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Root configuration for both the inbound listener and the outbound sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outbound delivery target
    #[serde(default)]
    pub outbound: OutboundConfig,

    /// Inbound listener settings
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Alert storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from an optional YAML file merged with `RAVE_`
    /// environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the merged sources do
    /// not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let merged = builder
            .add_source(
                config::Environment::with_prefix("RAVE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ConfigError::load_failed(
                    path.map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<environment>".to_string()),
                    e.to_string(),
                )
            })?;

        merged
            .try_deserialize()
            .map_err(|e| ConfigError::invalid_format(e.to_string()))
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::invalid_format(e.to_string()))
    }
}

/// Where and how a built alert is delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundConfig {
    /// CAP inbound listener URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic-auth username for the listener
    pub username: Option<String>,

    /// Basic-auth password for the listener
    pub password: Option<String>,
}

fn default_url() -> String {
    "http://localhost".to_string()
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
        }
    }
}

impl OutboundConfig {
    /// Returns the configured credential pair, or an error when either half
    /// is missing. Delivery never proceeds with partial credentials.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Inbound listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Listener bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Listener bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Basic-auth users allowed to post alerts (username -> password)
    #[serde(default)]
    pub users: HashMap<String, String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            users: HashMap::new(),
        }
    }
}

impl ListenerConfig {
    /// Returns the listener bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Alert storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the current alert file and its `archive/`
    #[serde(default = "default_write_dir")]
    pub write_dir: PathBuf,
}

fn default_write_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            write_dir: default_write_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, or error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::invalid_value(
                "logging.level",
                format!("invalid log level: {}", self.level),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.outbound.url, "http://localhost");
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.logging.level, "warn");
        assert!(config.listener.users.is_empty());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
outbound:
  url: https://cap.example.org/inbound
  username: ops
  password: hunter2

listener:
  host: 127.0.0.1
  port: 8080
  users:
    ingest: s3cret

storage:
  write_dir: /var/lib/ravealert

logging:
  level: debug
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.outbound.url, "https://cap.example.org/inbound");
        assert_eq!(config.listener.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.listener.users["ingest"], "s3cret");
        assert_eq!(config.storage.write_dir, PathBuf::from("/var/lib/ravealert"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let mut outbound = OutboundConfig::default();
        assert!(matches!(
            outbound.credentials(),
            Err(ConfigError::MissingCredentials)
        ));

        outbound.username = Some("ops".to_string());
        assert!(outbound.credentials().is_err());

        outbound.password = Some("hunter2".to_string());
        assert_eq!(outbound.credentials().unwrap(), ("ops", "hunter2"));
    }

    #[test]
    fn test_logging_parse_level() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
        };
        assert_eq!(logging.parse_level().unwrap(), Level::DEBUG);

        let invalid = LoggingConfig {
            level: "loud".to_string(),
        };
        assert!(invalid.parse_level().is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let missing = Path::new("/definitely/not/here.yaml");
        assert!(matches!(
            AppConfig::load(Some(missing)),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
