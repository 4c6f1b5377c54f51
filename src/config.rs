//! Optimizer configuration module.
//!
//! Handles loading, validating, and merging `gltf-slim.toml`. Stock defaults
//! are overridden by the user's config file, which is looked up in the
//! current directory unless a path is given with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "optimized"  # Where outputs go when --output is not given
//! clean_output_dir = false  # Empty output_dir before writing
//!
//! [jpeg]
//! quality = 95              # Re-encoding quality (1-100)
//!
//! [png]
//! compression = "best"      # default | fast | best
//! filter = "adaptive"       # none | sub | up | avg | paeth | adaptive
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [jpeg]
//! quality = 85
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{EncodeParams, PngCompression, PngFilter, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "gltf-slim.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Optimizer configuration loaded from `gltf-slim.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlimConfig {
    /// Directory outputs are written to when no explicit output path is given.
    pub output_dir: PathBuf,
    /// Remove everything in `output_dir` before the run.
    pub clean_output_dir: bool,
    /// JPEG re-encoding settings.
    pub jpeg: JpegConfig,
    /// PNG re-encoding settings.
    pub png: PngConfig,
}

impl Default for SlimConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("optimized"),
            clean_output_dir: false,
            jpeg: JpegConfig::default(),
            png: PngConfig::default(),
        }
    }
}

impl SlimConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(ConfigError::Validation(
                "jpeg.quality must be 1-100".into(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Codec settings derived from this config.
    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            jpeg_quality: Quality::new(self.jpeg.quality),
            png_compression: self.png.compression,
            png_filter: self.png.filter,
        }
    }
}

/// JPEG re-encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    /// Encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: u32::from(Quality::default().value()),
        }
    }
}

/// PNG re-encoding settings. PNG output is always lossless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PngConfig {
    pub compression: PngCompression,
    pub filter: PngFilter,
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SlimConfig::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SlimConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SlimConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// With an explicit `path` the file must exist. Without one,
/// [`CONFIG_FILENAME`] in the working directory is used if present and the
/// stock defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<SlimConfig, ConfigError> {
    let overlay = match path {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(Path::new(CONFIG_FILENAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `gltf-slim.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gltf-slim Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The file is read from ./gltf-slim.toml, or from the path given with
# --config. Unknown keys will cause an error.

# Directory optimized files are written to when --output is not given.
# Each output keeps its input's filename; external textures and buffers
# are written next to it.
output_dir = "optimized"

# Remove everything in output_dir before writing.
clean_output_dir = false

# ---------------------------------------------------------------------------
# JPEG re-encoding (lossy)
# ---------------------------------------------------------------------------
[jpeg]
# Encoding quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# PNG re-encoding (lossless)
# ---------------------------------------------------------------------------
[png]
# Deflate effort: "default", "fast" or "best".
compression = "best"

# Row filter: "none", "sub", "up", "avg", "paeth" or "adaptive".
# "adaptive" picks the best filter for every row.
filter = "adaptive"
"##
}
