//! Logging setup shared by the dagapp binaries and tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod logging;

pub use logging::{init_logging, init_test_tracing, LogExt};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup record
    pub service_name: String,
    /// Log level filter (e.g., "info,dagapp_core=debug"); `RUST_LOG` wins when set
    pub log_filter: String,
    /// Emit JSON lines instead of the pretty format
    pub enable_json_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "dagapp".to_string(),
            log_filter: "info".to_string(),
            enable_json_logging: false,
        }
    }
}

impl MonitoringConfig {
    /// Read `SERVICE_NAME`, `LOG_FILTER` and `LOG_FORMAT` (`json` or `pretty`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: lookup("SERVICE_NAME").unwrap_or(defaults.service_name),
            log_filter: lookup("LOG_FILTER").unwrap_or(defaults.log_filter),
            enable_json_logging: lookup("LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.enable_json_logging),
        }
    }
}

/// Initialize logging for a binary
pub fn init(config: &MonitoringConfig) -> anyhow::Result<()> {
    init_logging(config)?;
    info!(config = ?config, "Monitoring initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let config = MonitoringConfig::default();
        assert_eq!(config.service_name, "dagapp");
        assert_eq!(config.log_filter, "info");
        assert!(!config.enable_json_logging);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = MonitoringConfig::from_lookup(|key| match key {
            "LOG_FORMAT" => Some("JSON".to_string()),
            "LOG_FILTER" => Some("debug".to_string()),
            _ => None,
        });

        assert_eq!(
            config,
            MonitoringConfig {
                service_name: "dagapp".to_string(),
                log_filter: "debug".to_string(),
                enable_json_logging: true,
            }
        );
    }
}
