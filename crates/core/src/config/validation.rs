//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CONFIG_ERROR: failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("CONFIG_ERROR: invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("CONFIG_ERROR: missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `default_ttl_secs` is 0
    /// - `sweep_interval_secs` is 0 or exceeds one day
    /// - `eviction_percent` is outside 1-100
    /// - `source_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `key_prefix` or `user_agent` is empty
    /// - `source_base_url` is set but is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "default_ttl_secs".into(), reason: "must be at least 1s".into() });
        }

        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "sweep_interval_secs".into(),
                reason: "must be at least 1s".into(),
            });
        }
        if self.sweep_interval_secs > 86_400 {
            return Err(ConfigError::Invalid {
                field: "sweep_interval_secs".into(),
                reason: "must not exceed one day (86400s)".into(),
            });
        }

        if !(1..=100).contains(&self.eviction_percent) {
            return Err(ConfigError::Invalid { field: "eviction_percent".into(), reason: "must be within 1-100".into() });
        }

        if self.source_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "source_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.source_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "source_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.key_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "key_prefix".into(), reason: "must not be empty".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if let Some(base_url) = &self.source_base_url {
            match url::Url::parse(base_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => {
                    return Err(ConfigError::Invalid {
                        field: "source_base_url".into(),
                        reason: format!("unsupported scheme `{}`", url.scheme()),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid { field: "source_base_url".into(), reason: e.to_string() });
                }
            }
        }

        if self.durable_max_entries == Some(0) {
            tracing::warn!("durable_max_entries is 0; every first page will be cached in memory only");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { default_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "default_ttl_secs"));
    }

    #[test]
    fn test_validate_sweep_interval_bounds() {
        let config = AppConfig { sweep_interval_secs: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "sweep_interval_secs"));

        let config = AppConfig { sweep_interval_secs: 86_401, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "sweep_interval_secs"));
    }

    #[test]
    fn test_validate_eviction_percent() {
        let config = AppConfig { eviction_percent: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "eviction_percent"));

        let config = AppConfig { eviction_percent: 101, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "eviction_percent"));

        let config = AppConfig { eviction_percent: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { source_timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "source_timeout_ms"));

        let config = AppConfig { source_timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "source_timeout_ms"));
    }

    #[test]
    fn test_validate_empty_strings() {
        let config = AppConfig { key_prefix: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "key_prefix"));

        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_source_base_url() {
        let config = AppConfig { source_base_url: Some("ftp://example.com".into()), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "source_base_url"));

        let config = AppConfig { source_base_url: Some("not a url".into()), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "source_base_url"));

        let config = AppConfig { source_base_url: Some("http://localhost:8080/api/".into()), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            default_ttl_secs: 1,
            sweep_interval_secs: 1,
            eviction_percent: 1,
            source_timeout_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
