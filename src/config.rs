//! Configuration loading and validation.
//!
//! Settings live in a `snapship.toml`:
//!
//! ```toml
//! [store]
//! base_url = "https://files.example.com/storage/v1"
//! bucket = "avatars"
//!
//! [compression]
//! target_width = 800
//! max_bytes = 1048576
//! initial_quality = 80
//! quality_step = 10
//! quality_floor = 10
//! ```
//!
//! ## Partial Configuration
//!
//! A config file only needs the values being overridden:
//!
//! ```toml
//! # Only tighten the byte budget
//! [compression]
//! max_bytes = 524288
//! ```
//!
//! Unknown keys are an error, so typos surface at load time.
//!
//! Credentials are never configuration: the access token and user id come
//! from the environment (see the CLI) or are passed in by the embedding
//! application. A config file on disk holds no secrets.

use crate::imaging::{CompressionConfig, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default config filename looked up in the working directory.
pub const CONFIG_FILE: &str = "snapship.toml";

/// Tool configuration loaded from [`CONFIG_FILE`].
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Object store endpoint and bucket.
    pub store: StoreConfig,
    /// Compression loop settings.
    pub compression: CompressionSettings,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compression.validate()
    }
}

/// Object store endpoint settings.
///
/// `base_url` has no default — it identifies *your* store — so commands that
/// talk to the store check it with [`StoreConfig::require`] first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Store API root, e.g. `https://files.example.com/storage/v1`.
    pub base_url: String,
    /// Bucket all keys are relative to.
    pub bucket: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bucket: "avatars".to_string(),
        }
    }
}

impl StoreConfig {
    /// Check the settings a store-touching command needs.
    pub fn require(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "store.base_url must be set (config file or --base-url)".into(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "store.base_url must start with http:// or https://".into(),
            ));
        }
        if self.bucket.is_empty() {
            return Err(ConfigError::Validation("store.bucket must not be empty".into()));
        }
        Ok(())
    }
}

/// Compression loop settings as written in TOML.
///
/// Quality values are plain integers here;
/// [`CompressionSettings::to_compression_config`] converts into the typed
/// settings the imaging module runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionSettings {
    /// Output width in pixels (height follows the source aspect ratio).
    pub target_width: u32,
    /// Byte budget for the stored image.
    pub max_bytes: u64,
    /// Quality of the first encode attempt (1-100).
    pub initial_quality: u8,
    /// Quality points dropped between attempts.
    pub quality_step: u8,
    /// Lowest quality tried before giving up on the budget (1-100).
    pub quality_floor: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            target_width: 800,
            max_bytes: 1024 * 1024,
            initial_quality: 80,
            quality_step: 10,
            quality_floor: 10,
        }
    }
}

impl CompressionSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_width == 0 {
            return Err(ConfigError::Validation(
                "compression.target_width must be at least 1".into(),
            ));
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "compression.max_bytes must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("compression.initial_quality", self.initial_quality),
            ("compression.quality_floor", self.quality_floor),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        if self.quality_floor > self.initial_quality {
            return Err(ConfigError::Validation(
                "compression.quality_floor must not exceed initial_quality".into(),
            ));
        }
        if self.quality_step == 0 {
            return Err(ConfigError::Validation(
                "compression.quality_step must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Convert into the typed settings the compression loop runs on.
    pub fn to_compression_config(&self) -> CompressionConfig {
        CompressionConfig {
            target_width: self.target_width,
            max_bytes: self.max_bytes,
            initial_quality: Quality::new(self.initial_quality),
            quality_step: self.quality_step,
            quality_floor: Quality::new(self.quality_floor),
        }
    }
}

fn parse_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load configuration.
///
/// With an explicit path the file must exist and parse. With `None`, a
/// [`CONFIG_FILE`] in the working directory is used when present, stock
/// defaults otherwise. The result is validated either way.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                parse_file(default_path)?
            } else {
                Config::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `snapship.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Snapship Configuration
# ======================
# All settings are optional except store.base_url, which has no sensible
# default. Values shown below are the defaults. Unknown keys are an error.
#
# Credentials never live here: the access token comes from SNAPSHIP_TOKEN
# and the user id (for owner-scoped keys) from SNAPSHIP_USER_ID.

# ---------------------------------------------------------------------------
# Object store
# ---------------------------------------------------------------------------
[store]
# Store API root. Writes go to {base_url}/object/{bucket}/{key}.
base_url = ""

# Bucket all keys are relative to.
bucket = "avatars"

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compression]
# Output width in pixels. Height follows the source aspect ratio.
target_width = 800

# Byte budget for the stored image (1048576 = 1 MiB). Quality drops until
# the encoded JPEG fits, or quality_floor is reached — a floor result is
# uploaded even when still over budget.
max_bytes = 1048576

# Quality of the first encode attempt (1-100).
initial_quality = 80

# Quality points dropped between attempts.
quality_step = 10

# Lowest quality tried (1-100).
quality_floor = 10
"##
}
