//! Layered configuration for code lookups
//!
//! Values come from optional `config/default` and `config/local` files, then
//! from `LOOKUP_*` environment variables (nested keys separated by `__`), e.g.
//! `LOOKUP_URL_HOST` or `LOOKUP_CACHE__DEFAULT_DURATION_SECONDS`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::fetch::DEFAULT_FETCH_TIMEOUT_SECS;

/// Water Quality Portal host used when none is configured
pub const DEFAULT_URL_HOST: &str = "https://www.waterqualitydata.us";

/// One hour
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 3600;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Scheme and host of the codes service, without a trailing path
    pub url_host: String,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when a caller does not supply one
    pub default_duration_seconds: u64,
    /// Upper bound on each outbound GET
    pub fetch_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            url_host: DEFAULT_URL_HOST.to_string(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_duration_seconds: DEFAULT_CACHE_DURATION_SECS,
            fetch_timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl CacheConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_secs(self.default_duration_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

impl LookupConfig {
    /// Loads configuration from `config/` in the working directory and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Loads configuration from `default` and `local` files under `dir`, then the environment
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let default_file = dir.join("default");
        let local_file = dir.join("local");
        let default_file = default_file.to_string_lossy();
        let local_file = local_file.to_string_lossy();

        let config = config::Config::builder()
            .add_source(config::File::with_name(&default_file).required(false))
            .add_source(config::File::with_name(&local_file).required(false))
            .add_source(
                config::Environment::with_prefix("LOOKUP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
