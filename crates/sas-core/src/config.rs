//! Configuration for signing and SAS resolution.
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Unix: `~/.config/serval/sas.toml`
//! - Windows: `%APPDATA%\servalproject\serval\config\sas.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration
///
/// # Example TOML
///
/// ```toml
/// [keyring]
/// # path = "/var/lib/serval/serval.keyring"  # omit for the default location
/// pin = ""
///
/// [resolver]
/// request_timeout_ms = 5000
/// min_request_interval_ms = 100
/// poll_interval_ms = 250
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keyring: KeyringConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Keyring configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Path to the keyring file (unset = default location)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// PIN used to unlock the keyring
    #[serde(default)]
    pub pin: String,
}

/// SID:SAS resolution timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How long to wait for a key-map response
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Minimum spacing between two requests for the same SID
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Longest single transport poll; bounds how quickly shutdown is noticed
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_min_request_interval_ms() -> u64 {
    100
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "servalproject", "serval")
            .map(|dirs| dirs.config_dir().join("sas.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let resolver = &self.resolver;
        if resolver.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if resolver.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if resolver.poll_interval_ms > resolver.request_timeout_ms {
            return Err(ConfigError::ValidationError(format!(
                "poll_interval_ms ({}) must not exceed request_timeout_ms ({})",
                resolver.poll_interval_ms, resolver.request_timeout_ms
            )));
        }

        if let Some(path) = &self.keyring.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "keyring path must not be empty; omit it for the default location"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> &'static str {
        r#"# SAS signing configuration

[keyring]
# Path to the keyring file (omit for the default location)
# path = "/var/lib/serval/serval.keyring"
# PIN that unlocks the identities to use
pin = ""

[resolver]
# How long to wait for a key-map response, in milliseconds
request_timeout_ms = 5000
# Minimum spacing between requests for the same SID, in milliseconds
min_request_interval_ms = 100
# Longest single transport poll, in milliseconds
poll_interval_ms = 250

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Keyring path override
    pub keyring_path: Option<PathBuf>,
    /// PIN override
    pub pin: Option<String>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref path) = overrides.keyring_path {
            self.keyring.path = Some(path.clone());
        }
        if let Some(ref pin) = overrides.pin {
            self.keyring.pin = pin.clone();
        }
        if overrides.verbose == Some(true) {
            self.logging.level = "info".to_string();
        }
        if overrides.debug == Some(true) {
            self.logging.level = "debug".to_string();
        }
        self
    }
}
