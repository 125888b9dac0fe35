//! txscope configuration
//!
//! Every field has a default, so an empty YAML document is a valid config.
//! `TXSCOPE_*` environment variables override the endpoint, page size,
//! debounce interval and scroll threshold after the file is read.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigError, ConfigErrorCode, ConfigResult};

// ==================== Configuration Types ====================

/// Remote transaction endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the paginated transactions endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/transactions".to_string()
}

fn default_page_size() -> usize {
    10
}

/// Search input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a typed search is committed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

/// Infinite scroll settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Scrolled fraction that triggers the next page
    #[serde(default = "default_scroll_threshold")]
    pub threshold: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold: default_scroll_threshold(),
        }
    }
}

fn default_scroll_threshold() -> f64 {
    0.7
}

/// Query cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which cached pages are refreshed on reuse
    #[serde(default = "default_stale_time_ms")]
    pub stale_time_ms: u64,
    /// Idle time after which an inactive entry is evicted
    #[serde(default = "default_gc_time_ms")]
    pub gc_time_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: default_stale_time_ms(),
            gc_time_ms: default_gc_time_ms(),
        }
    }
}

fn default_stale_time_ms() -> u64 {
    60 * 1000
}

fn default_gc_time_ms() -> u64 {
    5 * 60 * 1000
}

impl CacheConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_millis(self.gc_time_ms)
    }
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Symbol prefixed to amounts
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
        }
    }
}

fn default_symbol() -> String {
    "$".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote endpoint settings
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Scroll settings
    #[serde(default)]
    pub scroll: ScrollConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> ConfigResult<Self> {
        let display = path.to_string_lossy().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound { path: display });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::IoError {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        log::debug!("Loaded configuration from {}", display);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override values from `TXSCOPE_*` environment variables
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TXSCOPE_BASE_URL") {
            self.remote.base_url = url;
        }
        if let Some(size) = lookup("TXSCOPE_PAGE_SIZE") {
            self.remote.page_size = parse_override("TXSCOPE_PAGE_SIZE", &size)?;
        }
        if let Some(ms) = lookup("TXSCOPE_DEBOUNCE_MS") {
            self.search.debounce_ms = parse_override("TXSCOPE_DEBOUNCE_MS", &ms)?;
        }
        if let Some(threshold) = lookup("TXSCOPE_SCROLL_THRESHOLD") {
            self.scroll.threshold = parse_override("TXSCOPE_SCROLL_THRESHOLD", &threshold)?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.remote.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid("remote.base_url", "Base URL must start with http:// or https://"));
        }

        if self.remote.page_size == 0 {
            return Err(ConfigError::invalid("remote.page_size", "Page size must be greater than 0"));
        }

        if self.search.debounce_ms == 0 {
            return Err(ConfigError::invalid("search.debounce_ms", "Debounce interval must be greater than 0"));
        }

        // NaN fails both comparisons
        if !(self.scroll.threshold > 0.0 && self.scroll.threshold <= 1.0) {
            return Err(ConfigError::invalid("scroll.threshold", "Scroll threshold must be in (0, 1]"));
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::invalid("currency.decimal_places", "Decimal places must be between 0 and 10"));
        }

        if self.cache.gc_time_ms < self.cache.stale_time_ms {
            log::warn!(
                "cache.gc_time_ms ({}) is shorter than cache.stale_time_ms ({}); entries will be evicted before they go stale",
                self.cache.gc_time_ms,
                self.cache.stale_time_ms
            );
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Debounce interval as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{}'", value)))
}

// ==================== Tests ====================
