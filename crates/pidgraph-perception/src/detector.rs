//! Pluggable symbol detection strategies.
//!
//! A [`DetectorChain`] tries its strategies in order and returns the first
//! successful detection. Failures never abort the chain; they are collected
//! so callers can surface them.

use std::fs;
use std::path::{Path, PathBuf};

use pidgraph_core::SymbolDetection;

use crate::symbols::{build_symbols, SymbolCandidate, SymbolPolicy};

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No detections available for {0}")]
    Missing(PathBuf),

    #[error("Detector unavailable: {0}")]
    Unavailable(String),
}

pub trait SymbolDetector: Send + Sync {
    fn name(&self) -> &str;
    fn detect(&self, image: &Path) -> Result<SymbolDetection, DetectionError>;
}

#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: DetectionError,
}

#[derive(Debug, Default)]
pub struct ChainOutcome {
    pub detection: SymbolDetection,
    /// Name of the strategy that produced `detection`, if any did.
    pub used: Option<String>,
    pub failures: Vec<StrategyFailure>,
}

#[derive(Default)]
pub struct DetectorChain {
    strategies: Vec<Box<dyn SymbolDetector>>,
}

impl DetectorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, detector: impl SymbolDetector + 'static) -> Self {
        self.strategies.push(Box::new(detector));
        self
    }

    pub fn push(&mut self, detector: Box<dyn SymbolDetector>) {
        self.strategies.push(detector);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn detect(&self, image: &Path) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();
        for strategy in &self.strategies {
            match strategy.detect(image) {
                Ok(detection) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        nodes = detection.nodes.len(),
                        "symbol detection succeeded"
                    );
                    outcome.detection = detection;
                    outcome.used = Some(strategy.name().to_string());
                    return outcome;
                }
                Err(error) => {
                    tracing::warn!(strategy = strategy.name(), %error, "symbol detection failed");
                    outcome.failures.push(StrategyFailure {
                        strategy: strategy.name().to_string(),
                        error,
                    });
                }
            }
        }
        outcome
    }
}

/// Reads detections computed offline from a JSON file beside the image.
///
/// For `sheet.png` the default sidecar is `sheet.symbols.json`. The file holds
/// either a finished [`SymbolDetection`] or a list of raw
/// [`SymbolCandidate`]s, which are run through [`build_symbols`].
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    suffix: String,
    policy: SymbolPolicy,
}

impl Default for SidecarDetector {
    fn default() -> Self {
        Self::new("symbols.json", SymbolPolicy::default())
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SidecarPayload {
    Candidates(Vec<SymbolCandidate>),
    Detection(SymbolDetection),
}

impl SidecarDetector {
    pub fn new(suffix: impl Into<String>, policy: SymbolPolicy) -> Self {
        Self {
            suffix: suffix.into(),
            policy,
        }
    }

    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        image.with_file_name(format!("{stem}.{}", self.suffix))
    }
}

impl SymbolDetector for SidecarDetector {
    fn name(&self) -> &str {
        "sidecar"
    }

    fn detect(&self, image: &Path) -> Result<SymbolDetection, DetectionError> {
        let path = self.sidecar_path(image);
        if !path.exists() {
            return Err(DetectionError::Missing(path));
        }
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<SidecarPayload>(&content)? {
            SidecarPayload::Detection(d) => Ok(d),
            SidecarPayload::Candidates(c) => Ok(build_symbols(&c, &self.policy)),
        }
    }
}
