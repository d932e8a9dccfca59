//! Analyzer configuration.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied by the binary)
//! 2. TOML config file (`--config`)
//! 3. Compiled defaults
//!
//! Unknown keys are ignored so older binaries accept newer files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzer::DEFAULT_SUBGROUP_SIZE;
use crate::chart::RenderOptions;
use crate::distribution::BandwidthMethod;
use crate::error::ConfigError;

/// Settings for a [`CapabilityAnalyzer`](crate::analyzer::CapabilityAnalyzer).
///
/// # Examples
///
/// ```
/// use u_capability::config::AnalyzerConfig;
///
/// let config = AnalyzerConfig::from_toml("subgroup_size = 4\nwidth = 800").unwrap();
/// assert_eq!(config.subgroup_size, 4);
/// assert_eq!(config.width, 800);
/// assert_eq!(config.column, "Measurement");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Name of the measurement column.
    pub column: String,
    /// Subgroup size for the X̄ and R charts.
    pub subgroup_size: usize,
    /// Number of histogram bins.
    pub histogram_bins: usize,
    /// Number of KDE evaluation points.
    pub kde_points: usize,
    /// KDE bandwidth rule.
    pub kde_bandwidth: BandwidthMethod,
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            column: "Measurement".to_string(),
            subgroup_size: DEFAULT_SUBGROUP_SIZE,
            histogram_bins: render.histogram_bins,
            kde_points: render.kde_points,
            kde_bandwidth: render.bandwidth,
            width: render.width,
            height: render.height,
        }
    }
}

impl AnalyzerConfig {
    /// Parses and validates a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Self::parse(toml_str, "<string>")
    }

    /// Reads, parses, and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(toml_str: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| ConfigError::Invalid {
            field: field.to_string(),
            message: message.to_string(),
        };
        if self.column.trim().is_empty() {
            return Err(invalid("column", "must not be empty"));
        }
        if self.subgroup_size == 0 {
            return Err(invalid("subgroup_size", "must be greater than 0"));
        }
        if self.histogram_bins == 0 {
            return Err(invalid("histogram_bins", "must be greater than 0"));
        }
        if self.kde_points < 2 {
            return Err(invalid("kde_points", "must be at least 2"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(invalid("width/height", "must be greater than 0"));
        }
        if let BandwidthMethod::Manual(h) = self.kde_bandwidth {
            if !(h.is_finite() && h > 0.0) {
                return Err(invalid("kde_bandwidth", "manual bandwidth must be positive"));
            }
        }
        Ok(())
    }

    /// Rendering settings derived from this config.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
            histogram_bins: self.histogram_bins,
            kde_points: self.kde_points,
            bandwidth: self.kde_bandwidth,
        }
    }
}
