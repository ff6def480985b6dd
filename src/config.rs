//! SDK configuration.
//!
//! A [`Config`] is built once by the host, either programmatically with
//! [`Config::builder`] or from environment variables with [`load_from_env`],
//! and handed to [`crate::Orchestrator`].
//!
//! ## Environment Variables
//!
//! ```bash
//! export LIMELINK_API_KEY="your-api-key"
//! export LIMELINK_BASE_URL="https://limelink.org/"
//! ```
//!
//! ## Required Variables
//!
//! - `LIMELINK_API_KEY` - Private API key, sent with stats events
//!
//! ## Optional Variables
//!
//! - `LIMELINK_BASE_URL` - Lookup service base URL (default: `https://limelink.org/`)
//! - `LIMELINK_LOGGING` - Verbose lifecycle diagnostics (default: `false`)
//! - `LIMELINK_DEFERRED_ENABLED` - Deferred deep link check (default: `true`)
//! - `LIMELINK_ROOT_DOMAIN` - Root domain of subdomain links (default: `limelink.org`)
//! - `LIMELINK_LEGACY_HOST` - Legacy link host (default: `deep.limelink.org`)
//! - `LIMELINK_PLATFORM` - Platform marker (default: `android`)
//! - `LIMELINK_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `LIMELINK_STATS_QUEUE_CAPACITY` - Stats event buffer size (default: 1000, min: 10)
//! - `LIMELINK_DELIVERY_QUEUE_CAPACITY` - Listener delivery buffer size (default: 256)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use url::Url;
use validator::Validate;

use crate::utils::link_classifier::{DEFAULT_LEGACY_HOST, DEFAULT_ROOT_DOMAIN};

pub const DEFAULT_BASE_URL: &str = "https://limelink.org/";
pub const DEFAULT_PLATFORM: &str = "android";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATS_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_DELIVERY_QUEUE_CAPACITY: usize = 256;

/// Errors returned when a configuration is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API key must not be blank")]
    BlankApiKey,

    #[error("Base URL must be an absolute http(s) URL, got '{0}'")]
    InvalidBaseUrl(String),

    #[error("LOG_FORMAT must be 'text' or 'json', got '{0}'")]
    InvalidLogFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// SDK configuration.
#[derive(Clone, Validate)]
pub struct Config {
    pub api_key: String,
    #[validate(url)]
    pub base_url: String,
    /// Gates the orchestrator's verbose lifecycle diagnostics. Warnings and
    /// errors are emitted regardless.
    pub logging_enabled: bool,
    pub deferred_deeplink_enabled: bool,
    #[validate(length(min = 1))]
    pub root_domain: String,
    #[validate(length(min = 1))]
    pub legacy_host: String,
    /// Sent as `platform` on legacy lookups and `operating_system` on stats.
    #[validate(length(min = 1))]
    pub platform: String,
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
    #[validate(range(min = 10, max = 1_000_000))]
    pub stats_queue_capacity: usize,
    #[validate(range(min = 1, max = 65_536))]
    pub delivery_queue_capacity: usize,
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Starts a builder with every optional setting at its default.
    pub fn builder(api_key: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                base_url: DEFAULT_BASE_URL.to_string(),
                logging_enabled: false,
                deferred_deeplink_enabled: true,
                root_domain: DEFAULT_ROOT_DOMAIN.to_string(),
                legacy_host: DEFAULT_LEGACY_HOST.to_string(),
                platform: DEFAULT_PLATFORM.to_string(),
                request_timeout_secs: DEFAULT_TIMEOUT_SECS,
                stats_queue_capacity: DEFAULT_STATS_QUEUE_CAPACITY,
                delivery_queue_capacity: DEFAULT_DELIVERY_QUEUE_CAPACITY,
                log_level: "info".to_string(),
                log_format: "text".to_string(),
            },
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `LIMELINK_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("LIMELINK_API_KEY").context("LIMELINK_API_KEY must be set")?;

        let mut builder = Self::builder(api_key);
        let config = &mut builder.config;

        if let Ok(base_url) = env::var("LIMELINK_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(enabled) = env_flag("LIMELINK_LOGGING") {
            config.logging_enabled = enabled;
        }
        if let Some(enabled) = env_flag("LIMELINK_DEFERRED_ENABLED") {
            config.deferred_deeplink_enabled = enabled;
        }
        if let Ok(root_domain) = env::var("LIMELINK_ROOT_DOMAIN") {
            config.root_domain = root_domain;
        }
        if let Ok(legacy_host) = env::var("LIMELINK_LEGACY_HOST") {
            config.legacy_host = legacy_host;
        }
        if let Ok(platform) = env::var("LIMELINK_PLATFORM") {
            config.platform = platform;
        }

        config.request_timeout_secs = env::var("LIMELINK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        config.stats_queue_capacity = env::var("LIMELINK_STATS_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STATS_QUEUE_CAPACITY);

        config.delivery_queue_capacity = env::var("LIMELINK_DELIVERY_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DELIVERY_QUEUE_CAPACITY);

        config.log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        config.log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        Ok(builder.config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if:
    /// - `api_key` is blank
    /// - `base_url` is not an absolute http(s) URL
    /// - `log_format` is not `text` or `json`
    /// - a numeric setting is out of range or a host setting is empty
    pub fn check(&self) -> std::result::Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::BlankApiKey);
        }

        let base_url_ok = Url::parse(&self.base_url)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .unwrap_or(false);
        if !base_url_ok {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }

        if self.log_format != "text" && self.log_format != "json" {
            return Err(ConfigError::InvalidLogFormat(self.log_format.clone()));
        }

        Validate::validate(self)?;
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// See [`Self::check`].
    pub fn validate(&self) -> Result<()> {
        self.check().context("Invalid LimeLink configuration")
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  API key: {}", mask_api_key(&self.api_key));
        tracing::info!("  Base URL: {}", self.base_url);
        tracing::info!("  Root domain: {}", self.root_domain);
        tracing::info!("  Legacy host: {}", self.legacy_host);
        tracing::info!("  Platform: {}", self.platform);
        tracing::info!(
            "  Deferred deep links: {}",
            if self.deferred_deeplink_enabled { "enabled" } else { "disabled" }
        );
        tracing::info!("  Request timeout: {}s", self.request_timeout_secs);
        tracing::info!("  Stats queue capacity: {}", self.stats_queue_capacity);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("logging_enabled", &self.logging_enabled)
            .field("deferred_deeplink_enabled", &self.deferred_deeplink_enabled)
            .field("root_domain", &self.root_domain)
            .field("legacy_host", &self.legacy_host)
            .field("platform", &self.platform)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("stats_queue_capacity", &self.stats_queue_capacity)
            .field("delivery_queue_capacity", &self.delivery_queue_capacity)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Fluent builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn logging_enabled(mut self, enabled: bool) -> Self {
        self.config.logging_enabled = enabled;
        self
    }

    pub fn deferred_deeplink_enabled(mut self, enabled: bool) -> Self {
        self.config.deferred_deeplink_enabled = enabled;
        self
    }

    pub fn root_domain(mut self, root_domain: impl Into<String>) -> Self {
        self.config.root_domain = root_domain.into();
        self
    }

    pub fn legacy_host(mut self, legacy_host: impl Into<String>) -> Self {
        self.config.legacy_host = legacy_host.into();
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.config.platform = platform.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn stats_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.stats_queue_capacity = capacity;
        self
    }

    pub fn delivery_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.delivery_queue_capacity = capacity;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.config.log_format = format.into();
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// See [`Config::check`].
    pub fn build(self) -> std::result::Result<Config, ConfigError> {
        self.config.check()?;
        Ok(self.config)
    }
}

/// Masks an API key for logging: the first four characters, then `***`.
pub fn mask_api_key(api_key: &str) -> String {
    let visible: String = api_key.chars().take(4).collect();
    format!("{}***", visible)
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in the binary).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "LIMELINK_API_KEY",
        "LIMELINK_BASE_URL",
        "LIMELINK_LOGGING",
        "LIMELINK_DEFERRED_ENABLED",
        "LIMELINK_ROOT_DOMAIN",
        "LIMELINK_LEGACY_HOST",
        "LIMELINK_PLATFORM",
        "LIMELINK_TIMEOUT_SECS",
        "LIMELINK_STATS_QUEUE_CAPACITY",
        "LIMELINK_DELIVERY_QUEUE_CAPACITY",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        // SAFETY: Tests touching the environment are run serially
        unsafe {
            for name in ENV_VARS {
                env::remove_var(name);
            }
        }
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("abcdef123456"), "abcd***");
        assert_eq!(mask_api_key("ab"), "ab***");
        assert_eq!(mask_api_key(""), "***");
    }

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder("api-key").build().unwrap();

        assert_eq!(config.base_url, "https://limelink.org/");
        assert!(!config.logging_enabled);
        assert!(config.deferred_deeplink_enabled);
        assert_eq!(config.root_domain, "limelink.org");
        assert_eq!(config.legacy_host, "deep.limelink.org");
        assert_eq!(config.platform, "android");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.stats_queue_capacity, 1000);
    }

    #[test]
    fn test_blank_api_key_rejected() {
        assert!(matches!(
            Config::builder("   ").build(),
            Err(ConfigError::BlankApiKey)
        ));
        assert!(matches!(
            Config::builder("").build(),
            Err(ConfigError::BlankApiKey)
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::builder("api-key").build().unwrap();
        assert!(config.validate().is_ok());

        config.base_url = "ftp://limelink.org/".to_string();
        assert!(matches!(config.check(), Err(ConfigError::InvalidBaseUrl(_))));

        config.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.base_url = "http://127.0.0.1:8080".to_string();
        assert!(config.validate().is_ok());

        config.stats_queue_capacity = 5;
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));

        config.stats_queue_capacity = 1000;
        config.log_format = "xml".to_string();
        assert!(matches!(config.check(), Err(ConfigError::InvalidLogFormat(_))));

        config.log_format = "json".to_string();
        config.root_domain = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config::builder("secret-api-key").build().unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("secr***"));
        assert!(!debug.contains("secret-api-key"));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_key() {
        clear_env();
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("LIMELINK_API_KEY", "env-key");
            env::set_var("LIMELINK_BASE_URL", "http://localhost:9000/");
            env::set_var("LIMELINK_LOGGING", "1");
            env::set_var("LIMELINK_DEFERRED_ENABLED", "false");
            env::set_var("LIMELINK_TIMEOUT_SECS", "3");
            env::set_var("LIMELINK_STATS_QUEUE_CAPACITY", "not-a-number");
        }

        let config = load_from_env().unwrap();

        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.base_url, "http://localhost:9000/");
        assert!(config.logging_enabled);
        assert!(!config.deferred_deeplink_enabled);
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.stats_queue_capacity, DEFAULT_STATS_QUEUE_CAPACITY);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_rejects_blank_key() {
        clear_env();
        // SAFETY: Tests are run serially
        unsafe {
            env::set_var("LIMELINK_API_KEY", " ");
        }

        assert!(load_from_env().is_err());

        clear_env();
    }
}
