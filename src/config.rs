//! Optimizer configuration module.
//!
//! Handles loading and validating `photo-slim.toml` files. Every key is
//! optional; omitted values fall back to the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [envelope]
//! max_width = 1280.0        # Output must fit inside this box
//! max_height = 1280.0
//! use_max_dimension = true  # true: fit inside the box, false: cover it
//! min_width = 0             # Scale up below this width (0 = off)
//! min_height = 0            # Scale up below this height (0 = off)
//!
//! [output]
//! directory = "optimized"   # Where produced JPEGs are written
//! prefix = "optimized"      # Files are named <prefix>_<uuid>.jpg
//! quality = 80              # JPEG quality (0-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Envelope, ImagingError, OptimizeSettings, OutputTarget, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
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

impl From<ConfigError> for ImagingError {
    fn from(err: ConfigError) -> Self {
        ImagingError::InvalidConfig(err.to_string())
    }
}

/// Optimizer configuration loaded from TOML.
///
/// All fields have sensible defaults. Config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Target box the output must fit (and optionally fill).
    pub envelope: EnvelopeConfig,
    /// Where and how produced files are written.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl OptimizerConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: OptimizerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let envelope = &self.envelope;
        let at_least_one = |v: f64| v.is_finite() && v >= 1.0;
        if !at_least_one(envelope.max_width) || !at_least_one(envelope.max_height) {
            return Err(ConfigError::Validation(
                "envelope.max_width and envelope.max_height must be at least 1".into(),
            ));
        }
        if envelope.min_width as f64 > envelope.max_width {
            return Err(ConfigError::Validation(format!(
                "envelope.min_width ({}) exceeds envelope.max_width ({})",
                envelope.min_width, envelope.max_width
            )));
        }
        if envelope.min_height as f64 > envelope.max_height {
            return Err(ConfigError::Validation(format!(
                "envelope.min_height ({}) exceeds envelope.max_height ({})",
                envelope.min_height, envelope.max_height
            )));
        }
        if self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 0-100".into(),
            ));
        }
        if self.output.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "output.prefix must not be empty".into(),
            ));
        }
        if self.output.prefix.chars().any(std::path::is_separator) {
            return Err(ConfigError::Validation(format!(
                "output.prefix must be a plain name, got {:?}",
                self.output.prefix
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Output envelope settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeConfig {
    pub max_width: f64,
    pub max_height: f64,
    /// Shrink by the larger axis ratio (fit) instead of the smaller (cover).
    pub use_max_dimension: bool,
    /// Minimum output width; 0 disables.
    pub min_width: u32,
    /// Minimum output height; 0 disables.
    pub min_height: u32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_width: 1280.0,
            max_height: 1280.0,
            use_max_dimension: true,
            min_width: 0,
            min_height: 0,
        }
    }
}

impl From<&EnvelopeConfig> for Envelope {
    fn from(config: &EnvelopeConfig) -> Self {
        Envelope {
            max_width: config.max_width,
            max_height: config.max_height,
            min_width: config.min_width,
            min_height: config.min_height,
            use_max_dimension: config.use_max_dimension,
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub prefix: String,
    /// JPEG quality (0-100).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("optimized"),
            prefix: "optimized".to_string(),
            quality: 80,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel optimize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

impl OptimizeSettings {
    /// Build per-call settings from a config, validating it first.
    pub fn from_config(config: &OptimizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(OptimizeSettings {
            envelope: Envelope::from(&config.envelope),
            quality: Quality::new(config.output.quality),
            output: OutputTarget {
                directory: config.output.directory.clone(),
                prefix: config.output.prefix.clone(),
            },
        })
    }
}

/// Load config from a TOML file.
///
/// A missing file yields the defaults. A file that exists must parse, must
/// not contain unknown keys, and must validate.
pub fn load_config(path: &Path) -> Result<OptimizerConfig, ConfigError> {
    if !path.exists() {
        return Ok(OptimizerConfig::default());
    }
    let content = fs::read_to_string(path)?;
    OptimizerConfig::from_toml_str(&content)
}

/// Returns a fully-commented stock config file with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-slim configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Envelope
# ---------------------------------------------------------------------------
[envelope]
# Output must fit inside max_width x max_height.
max_width = 1280.0
max_height = 1280.0

# true:  shrink by the larger axis ratio, so both edges fit inside the box.
# false: shrink by the smaller ratio, so the image covers the box; the
#        finalize step then trims the overshoot back inside.
use_max_dimension = true

# Scale up images that end up smaller than this. 0 disables an axis.
min_width = 0
min_height = 0

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory for produced files. Created on first write.
directory = "optimized"

# Produced files are named <prefix>_<uuid>.jpg.
prefix = "optimized"

# JPEG quality (0-100). Lower = smaller files, more artifacts.
quality = 80

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for batch runs. Omit for auto (= number of CPU cores).
# Values above the core count are clamped down.
# max_processes = 4
"##
}
