//! Variant configuration.
//!
//! Loads, validates and merges `config.toml`. Stock defaults are serialized to
//! a TOML table and the user's file is merged on top, so a config file only
//! needs the keys it overrides. The result is an immutable [`VariantConfig`]
//! that is built once and handed to every component that needs it.
//!
//! ## Configuration Options
//!
//! ```toml
//! media_url = "/media/"                 # prefix for every resolved URL
//! sized_dirname = "__sized__"           # root directory for sized variants
//! filtered_dirname = "__filtered__"     # sibling directory for filtered variants
//! placeholder_dirname = "__placeholder__"
//! # placeholder_image = "placeholder.png"
//! post_processor = "none"               # none | sha256 | sha256_16
//!
//! [quality]
//! jpeg = 70
//! webp = 70
//!
//! [variants]
//! sizers = ["crop", "thumbnail"]
//! filters = ["invert"]
//!
//! [rendition_key_sets]
//! headshot = [["full_size", "url"], ["small", "thumbnail__100x100"]]
//! ```
//!
//! Rendition key sets are kept as raw TOML here. They are checked by the
//! [`registry`](crate::registry) the first time each one is used.
//!
//! Unknown keys are rejected to catch typos early.

use crate::size_key::{DELIMITER, URL_TOKEN};
use crate::stored::FILTERS_CAPABILITY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in a config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything that determines variant names, paths and URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantConfig {
    /// Prefix joined onto storage names to form URLs.
    pub media_url: String,
    /// Directory that prefixes every sized variant path.
    pub sized_dirname: String,
    /// Directory placed next to the original for filtered variants.
    pub filtered_dirname: String,
    /// Directory holding the placeholder image.
    pub placeholder_dirname: String,
    /// File name of the placeholder used when an image is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_image: Option<String>,
    /// Named hook applied to every filename key.
    pub post_processor: PostProcessor,
    /// Quality embedded in lossy variant names.
    pub quality: QualityConfig,
    /// Capabilities exposed by stored images.
    pub variants: VariantsConfig,
    /// Named rendition key sets, validated on first use.
    pub rendition_key_sets: BTreeMap<String, toml::Value>,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            media_url: "/media/".to_string(),
            sized_dirname: "__sized__".to_string(),
            filtered_dirname: "__filtered__".to_string(),
            placeholder_dirname: "__placeholder__".to_string(),
            placeholder_image: None,
            post_processor: PostProcessor::None,
            quality: QualityConfig::default(),
            variants: VariantsConfig::default(),
            rendition_key_sets: BTreeMap::new(),
        }
    }
}

impl VariantConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("quality.jpeg", self.quality.jpeg),
            ("quality.webp", self.quality.webp),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        for (name, dir) in [
            ("sized_dirname", &self.sized_dirname),
            ("filtered_dirname", &self.filtered_dirname),
            ("placeholder_dirname", &self.placeholder_dirname),
        ] {
            if dir.is_empty() || dir.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a single non-empty directory name"
                )));
            }
        }
        if self.placeholder_image.as_deref() == Some("") {
            return Err(ConfigError::Validation(
                "placeholder_image must not be empty".into(),
            ));
        }
        let names = self.variants.sizers.iter().chain(&self.variants.filters);
        for name in names {
            if name.is_empty() || name.contains(DELIMITER) {
                return Err(ConfigError::Validation(format!(
                    "variant name '{name}' must be non-empty and must not contain '{DELIMITER}'"
                )));
            }
            if name == URL_TOKEN || name == FILTERS_CAPABILITY {
                return Err(ConfigError::Validation(format!(
                    "variant name '{name}' is reserved"
                )));
            }
        }
        Ok(())
    }
}

/// Named post-processing applied to filename keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessor {
    #[default]
    None,
    Sha256,
    #[serde(rename = "sha256_16")]
    Sha256_16,
}

/// Quality settings embedded in lossy variant names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    /// JPEG quality (1-100); also used for every lossy format except WebP.
    pub jpeg: u32,
    /// WebP quality (1-100).
    pub webp: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self { jpeg: 70, webp: 70 }
    }
}

/// Capabilities a stored image exposes to size keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    /// Dimension-keyed sizers, e.g. `crop__400x400`.
    pub sizers: Vec<String>,
    /// Filters reachable through `filters__<name>`.
    pub filters: Vec<String>,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            sizers: vec!["crop".to_string(), "thumbnail".to_string()],
            filters: vec!["invert".to_string()],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(VariantConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<VariantConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: VariantConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, on top of the stock defaults.
pub fn load_config(dir: &Path) -> Result<VariantConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Rendition Keys Configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Prefix joined onto storage paths to build URLs.
media_url = "/media/"

# Sized variants live under this directory, mirroring the original's folder:
#   photos/cat.jpg -> __sized__/photos/cat-crop-400x400-70.jpg
sized_dirname = "__sized__"

# Filtered variants live in this directory next to the original:
#   photos/cat.jpg -> photos/__filtered__/cat__invert__.jpg
filtered_dirname = "__filtered__"

# Directory holding the placeholder image.
placeholder_dirname = "__placeholder__"

# Image used when a record has no image. Omit to return no URLs instead.
# placeholder_image = "placeholder.png"

# Post-processing applied to the variant part of every file name.
#   none      - keep keys readable (crop-400x400-70)
#   sha256    - full SHA-256 hex digest of the key
#   sha256_16 - first 16 hex characters of the digest
post_processor = "none"

# ---------------------------------------------------------------------------
# Quality embedded in lossy variant names (1-100)
# ---------------------------------------------------------------------------
[quality]
jpeg = 70
webp = 70

# ---------------------------------------------------------------------------
# Capabilities reachable from size keys
# ---------------------------------------------------------------------------
[variants]
# Dimension-keyed sizers: crop__400x400, thumbnail__100x100
sizers = ["crop", "thumbnail"]
# Filters: filters__invert__url, filters__invert__crop__400x400
filters = ["invert"]

# ---------------------------------------------------------------------------
# Named rendition key sets: lists of [label, size key] pairs
# ---------------------------------------------------------------------------
[rendition_key_sets]
# headshot = [
#     ["full_size", "url"],
#     ["medium", "crop__400x400"],
#     ["small", "thumbnail__100x100"],
# ]
"##
}
