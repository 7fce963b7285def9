//! Configuration module
//!
//! TOML file at `~/.config/parkgate/config.toml` unless `PARKGATE_CONFIG`
//! or `--config` points elsewhere. Every section and key is optional.
//!
//! ```toml
//! [database]
//! url = "sqlite://./parkgate.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [pricing]
//! reserve_minimum = 300
//! hourly_rate = 100
//!
//! [allocation]
//! claim_attempts = 3
//! retry_delay_ms = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::services::PricingPolicy;
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::RetryConfig;

/// Env var overriding the config file location
pub const CONFIG_ENV: &str = "PARKGATE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub pricing: PricingPolicy,
    pub allocation: AllocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "parkgate=debug"
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Slot claim retry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    pub claim_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            claim_attempts: 3,
            retry_delay_ms: 10,
        }
    }
}

impl AllocationConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.claim_attempts,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryConfig::default()
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.hourly_rate <= 0 {
            return Err(ConfigError::Invalid(
                "pricing.hourly_rate must be positive".into(),
            ));
        }
        if self.pricing.reserve_minimum < 0 {
            return Err(ConfigError::Invalid(
                "pricing.reserve_minimum cannot be negative".into(),
            ));
        }
        if self.allocation.claim_attempts == 0 {
            return Err(ConfigError::Invalid(
                "allocation.claim_attempts must be at least 1".into(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".into()));
        }
        Ok(())
    }
}

/// `$PARKGATE_CONFIG`, else `~/.config/parkgate/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parkgate")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.pricing.reserve_minimum, 300);
        assert_eq!(config.pricing.hourly_rate, 100);
        assert_eq!(config.allocation.claim_attempts, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [pricing]
            hourly_rate = 150

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.pricing.hourly_rate, 150);
        assert_eq!(config.pricing.reserve_minimum, 300);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn rejects_zero_rate() {
        let err = AppConfig::from_toml("[pricing]\nhourly_rate = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_toml() {
        let err = AppConfig::from_toml("[pricing\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_default() {
        let config = AppConfig::load(Path::new("/nonexistent/parkgate/config.toml")).unwrap();
        assert_eq!(config.allocation.retry_delay_ms, 10);
    }

    #[test]
    fn allocation_maps_to_retry() {
        let retry = AllocationConfig {
            claim_attempts: 5,
            retry_delay_ms: 20,
        }
        .retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(20));
    }
}
