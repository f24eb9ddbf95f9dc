use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use tracing::info;
use validator::Validate;

use crate::models::work_order::validate_unit_interval;

/// Default values for configuration
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_GATEWAY_BASE_URL: &str = "http://localhost:3400/ai";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORAGE_PATH: &str = "fieldflow-work-orders.json";
const DEFAULT_LOG_LEVEL: &str = "info";

/// AI gateway endpoint configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct GatewayConfig {
    /// Base URL the transcription/analysis/invoice-draft endpoints hang off
    #[validate(url)]
    pub base_url: String,

    /// Per-call timeout in seconds; a hung call surfaces as a timeout error
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_BASE_URL.to_string(),
            timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
        }
    }
}

/// Work order persistence configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct PersistenceConfig {
    /// Path of the single JSON document holding the whole collection
    #[validate(length(min = 1))]
    pub path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORAGE_PATH.to_string(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    #[validate]
    pub gateway: GatewayConfig,

    #[validate]
    pub persistence: PersistenceConfig,

    /// Tax rate pre-filled on invoice forms, as a fraction in [0, 1]
    #[validate(custom = "validate_unit_interval")]
    pub default_tax_rate: Decimal,

    /// Log level filter used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            persistence: PersistenceConfig::default(),
            default_tax_rate: dec!(0.08),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Loads configuration from layered sources: `config/default`, an optional
/// per-run-mode file, then `FIELDFLOW_`-prefixed environment overrides
/// (e.g. `FIELDFLOW_GATEWAY__TIMEOUT_SECS=10`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for run mode {}", run_mode);

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_mode)).required(false))
        .add_source(Environment::with_prefix("FIELDFLOW").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config
        .validate()
        .map_err(|error| ConfigError::Message(format!("invalid configuration: {}", error)))?;
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.default_tax_rate, dec!(0.08));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = AppConfig::default();
        config.gateway.timeout_secs = 0;
        config.default_tax_rate = dec!(1.5);
        let errors = config.validate().unwrap_err();
        let all = errors.errors();
        assert!(all.contains_key("gateway"));
        assert!(all.contains_key("default_tax_rate"));
    }
}
