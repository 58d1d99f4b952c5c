//! Tunable thresholds for assembly and validation.
//!
//! Defaults reproduce the behaviour the downstream tooling expects; a JSON
//! file may override any subset of fields.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Pixel radii used when associating text and snapping line ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Text centre must be strictly closer than this to a node centre.
    pub node_text_radius: f64,
    /// Text centre must be strictly closer than this to a line midpoint.
    pub edge_text_radius: f64,
    /// A line end must be strictly closer than this to a node centre.
    pub endpoint_snap_radius: f64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            node_text_radius: 100.0,
            edge_text_radius: 50.0,
            endpoint_snap_radius: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Symbols below this confidence get an info issue.
    pub low_confidence_threshold: f64,
    /// Flag lines whose two ends snap to the same node.
    pub flag_self_loops: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.75,
            flag_self_loops: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub assembly: AssemblyConfig,
    pub validation: ValidationConfig,
    /// Parse resolved node tags into `attributes.parsed_tag`.
    pub annotate_tags: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assembly: AssemblyConfig::default(),
            validation: ValidationConfig::default(),
            annotate_tags: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        let radii = [
            ("assembly.node_text_radius", self.assembly.node_text_radius),
            ("assembly.edge_text_radius", self.assembly.edge_text_radius),
            ("assembly.endpoint_snap_radius", self.assembly.endpoint_snap_radius),
        ];
        for (name, value) in radii {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        let t = self.validation.low_confidence_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::Invalid(format!(
                "validation.low_confidence_threshold must lie in [0, 1], got {t}"
            )));
        }
        Ok(())
    }
}
