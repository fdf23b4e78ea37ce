//! Logging setup shared by the binaries.

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set. Repeat
/// initialization (as happens across tests) is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = config.parse_level()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_accepts_valid_level() {
        let config = LoggingConfig {
            level: "info".to_string(),
        };
        assert!(init_logging(&config).is_ok());
        // A second call must not fail even though a subscriber is installed.
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_init_logging_rejects_bad_level() {
        let config = LoggingConfig {
            level: "shouting".to_string(),
        };
        assert!(init_logging(&config).is_err());
    }
}
