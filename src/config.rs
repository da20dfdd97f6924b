//! Configuration management for toolprobe
//!
//! Settings load from environment variables with sensible defaults:
//!
//! - `TOOLPROBE_TIMEOUT`: per-invocation timeout in seconds - default: "30"
//! - `TOOLPROBE_LOG_LEVEL`: logging level - default: "info"
//! - `TOOLPROBE_LOG_JSON`: JSON log output (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use toolprobe::ProbeConfig;
//!
//! let config = ProbeConfig::from_env().expect("invalid configuration");
//! config.validate().expect("invalid configuration");
//! ```

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse a configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime parameters for the probing pipeline.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Bound on each compiler invocation; an expired child is killed.
    pub timeout: Duration,

    /// Logging level name, consumed by `util::logging::init_from_env`.
    pub log_level: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ProbeConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout = match env::var("TOOLPROBE_TIMEOUT") {
            Ok(value) => {
                let secs = value.parse::<u64>().map_err(|e| ConfigError::ParseError {
                    field: "TOOLPROBE_TIMEOUT".to_string(),
                    error: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let log_level =
            env::var("TOOLPROBE_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

        let config = Self { timeout, log_level };
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration with the given timeout and default logging.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Checks invariants that `Default`/`from_env` alone cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "TOOLPROBE_TIMEOUT must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn default_config_is_valid() {
        let config = ProbeConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn from_env_reads_timeout() {
        env::set_var("TOOLPROBE_TIMEOUT", "5");
        let config = ProbeConfig::from_env().unwrap();
        env::remove_var("TOOLPROBE_TIMEOUT");

        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn from_env_rejects_garbage_timeout() {
        env::set_var("TOOLPROBE_TIMEOUT", "soon");
        let result = ProbeConfig::from_env();
        env::remove_var("TOOLPROBE_TIMEOUT");

        match result {
            Err(ConfigError::ParseError { field, .. }) => {
                assert_eq!(field, "TOOLPROBE_TIMEOUT");
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn zero_timeout_fails_validation() {
        let config = ProbeConfig::with_timeout(Duration::ZERO);
        match config.validate() {
            Err(ConfigError::ValidationFailed(msg)) => {
                assert!(msg.contains("TOOLPROBE_TIMEOUT"));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn from_env_reads_log_level() {
        env::set_var("TOOLPROBE_LOG_LEVEL", "debug");
        let config = ProbeConfig::from_env().unwrap();
        env::remove_var("TOOLPROBE_LOG_LEVEL");

        assert_eq!(config.log_level, "debug");
    }
}
