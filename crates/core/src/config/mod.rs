//! Runtime settings for the cache and the server binary.
//!
//! Values are merged by figment: built-in defaults, then an optional TOML
//! file named by `QCACHE_CONFIG_FILE`, then `QCACHE_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (QCACHE_*)
/// 2. TOML config file (if QCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database backing the durable tier.
    ///
    /// Set via QCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// TTL applied to first-page reads when the caller does not pick one.
    ///
    /// Set via QCACHE_DEFAULT_TTL_SECS environment variable.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// How often the memory tier is swept for expired entries.
    ///
    /// Set via QCACHE_SWEEP_INTERVAL_SECS environment variable.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Share of durable entries (oldest first) dropped when the store is full.
    ///
    /// Set via QCACHE_EVICTION_PERCENT environment variable.
    #[serde(default = "default_eviction_percent")]
    pub eviction_percent: u8,

    /// Entry quota for the durable tier. Unlimited when unset.
    ///
    /// Set via QCACHE_DURABLE_MAX_ENTRIES environment variable.
    #[serde(default)]
    pub durable_max_entries: Option<usize>,

    /// Namespace for keys this cache writes to the durable tier.
    ///
    /// Set via QCACHE_KEY_PREFIX environment variable.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Base URL of the HTTP data source.
    ///
    /// Set via QCACHE_SOURCE_BASE_URL environment variable.
    /// Required only when the server starts.
    #[serde(default)]
    pub source_base_url: Option<String>,

    /// Data source request timeout in milliseconds.
    ///
    /// Set via QCACHE_SOURCE_TIMEOUT_MS environment variable.
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    /// User-Agent string for data source requests.
    ///
    /// Set via QCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./qcache.sqlite")
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_eviction_percent() -> u8 {
    50
}

fn default_key_prefix() -> String {
    "qcache:".into()
}

fn default_source_timeout_ms() -> u64 {
    20_000
}

fn default_user_agent() -> String {
    "qcache/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            eviction_percent: default_eviction_percent(),
            durable_max_entries: None,
            key_prefix: default_key_prefix(),
            source_base_url: None,
            source_timeout_ms: default_source_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Source timeout as Duration for use with reqwest/tokio.
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    /// Merge defaults, the optional TOML file and `QCACHE_*` variables, then validate.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadFailed` when a source cannot be read or parsed, or the
    /// validation error for the first out-of-range field.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("QCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("QCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that a data source URL is configured (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no base URL is set.
    pub fn require_source_base_url(&self) -> Result<&str, ConfigError> {
        self.source_base_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "source_base_url".into(),
            hint: "Set QCACHE_SOURCE_BASE_URL environment variable".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./qcache.sqlite"));
        assert_eq!(config.default_ttl_secs, 3600);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.eviction_percent, 50);
        assert!(config.durable_max_entries.is_none());
        assert_eq!(config.key_prefix, "qcache:");
        assert_eq!(config.source_timeout_ms, 20_000);
        assert_eq!(config.user_agent, "qcache/0.1");
        assert!(config.source_base_url.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.source_timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_require_source_base_url_missing() {
        let config = AppConfig::default();
        let result = config.require_source_base_url();
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_source_base_url_present() {
        let config = AppConfig { source_base_url: Some("https://api.example.com/v1/".into()), ..Default::default() };
        assert_eq!(config.require_source_base_url().unwrap(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("qcache.toml", "default_ttl_secs = 120\nkey_prefix = \"fs_cache_\"")?;
            jail.set_env("QCACHE_CONFIG_FILE", "qcache.toml");
            jail.set_env("QCACHE_DEFAULT_TTL_SECS", "300");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.default_ttl_secs, 300);
            assert_eq!(config.key_prefix, "fs_cache_");
            Ok(())
        });
    }
}
