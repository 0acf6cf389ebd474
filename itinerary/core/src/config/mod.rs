//! TOML Configuration File Support
//!
//! Centralized configuration loading for the planner, supporting a TOML file
//! at `~/.config/itinerary/itinerary.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (when applicable)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/itinerary/itinerary.toml` (typically `~/.config/itinerary/itinerary.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [provider]
//! model = "gemini-1.5-flash"
//!
//! [stream]
//! channel_capacity = 100
//! fragment_timeout_ms = 30000
//! read_chunk_size = 4096
//!
//! [store]
//! max_trips = 50
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{DEFAULT_CHUNK_SIZE, DEFAULT_MODEL};

/// Default bound on the fragment channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Provider section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderToml {
    /// Model identifier passed to the provider
    pub model: Option<String>,
}

/// Stream section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamToml {
    /// Fragment channel bound between provider and session
    pub channel_capacity: Option<usize>,

    /// Cancel when no fragment arrives within this many milliseconds (0 = never)
    pub fragment_timeout_ms: Option<u64>,

    /// Bytes per read when the provider is a byte reader
    pub read_chunk_size: Option<usize>,
}

/// Store section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreToml {
    /// Maximum trips kept (0 = unlimited)
    pub max_trips: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryToml {
    /// Provider configuration section
    pub provider: ProviderToml,

    /// Stream configuration section
    pub stream: StreamToml,

    /// Store configuration section
    pub store: StoreToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved planner configuration
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ItineraryConfig {
    /// Model identifier
    pub model: String,

    /// Fragment channel capacity
    pub channel_capacity: usize,

    /// Cancel when no fragment arrives within this long
    pub fragment_timeout: Option<Duration>,

    /// Read size for reader-backed providers
    pub read_chunk_size: usize,

    /// Maximum trips kept (0 = unlimited)
    pub max_trips: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ItineraryConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            fragment_timeout: None,
            read_chunk_size: DEFAULT_CHUNK_SIZE,
            max_trips: 0,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ItineraryConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero channel capacity,
    /// a zero read size or an empty model name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "stream.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "stream.read_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// 0 disables the timeout
fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/itinerary/itinerary.toml` or
/// `~/.config/itinerary/itinerary.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("itinerary").join("itinerary.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI arguments are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<ItineraryConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// With `None`, only defaults and environment variables are used.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if the
/// resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ItineraryConfig, ConfigError> {
    let mut config = ItineraryConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ItineraryToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ItineraryConfig, toml: &ItineraryToml) {
    if let Some(ref model) = toml.provider.model {
        config.model.clone_from(model);
    }

    if let Some(capacity) = toml.stream.channel_capacity {
        config.channel_capacity = capacity;
    }
    if let Some(ms) = toml.stream.fragment_timeout_ms {
        config.fragment_timeout = timeout_from_ms(ms);
    }
    if let Some(size) = toml.stream.read_chunk_size {
        config.read_chunk_size = size;
    }

    if let Some(max) = toml.store.max_trips {
        config.max_trips = max;
    }
}

/// Read and parse an environment variable, ignoring unparseable values
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ItineraryConfig) {
    if let Ok(model) = std::env::var("ITINERARY_MODEL") {
        config.model = model;
        config.source = ConfigSource::Env;
    }

    if let Some(capacity) = env_parse::<usize>("ITINERARY_CHANNEL_CAPACITY") {
        config.channel_capacity = capacity;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_parse::<u64>("ITINERARY_FRAGMENT_TIMEOUT_MS") {
        config.fragment_timeout = timeout_from_ms(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(size) = env_parse::<usize>("ITINERARY_READ_CHUNK_SIZE") {
        config.read_chunk_size = size;
        config.source = ConfigSource::Env;
    }

    if let Some(max) = env_parse::<usize>("ITINERARY_MAX_TRIPS") {
        config.max_trips = max;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Model override
    pub model: Option<String>,

    /// Read size override
    pub read_chunk_size: Option<usize>,

    /// Fragment timeout override (milliseconds, 0 = none)
    pub fragment_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create empty overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Override the read size
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = Some(size);
        self
    }

    /// Override the fragment timeout
    #[must_use]
    pub fn with_fragment_timeout_ms(mut self, ms: u64) -> Self {
        self.fragment_timeout_ms = Some(ms);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.read_chunk_size.is_none() && self.fragment_timeout_ms.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override produces an
    /// invalid configuration.
    pub fn apply(&self, config: &mut ItineraryConfig) -> Result<(), ConfigError> {
        if let Some(ref model) = self.model {
            config.model.clone_from(model);
        }
        if let Some(size) = self.read_chunk_size {
            config.read_chunk_size = size;
        }
        if let Some(ms) = self.fragment_timeout_ms {
            config.fragment_timeout = timeout_from_ms(ms);
        }

        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }
        config.validate()
    }
}
