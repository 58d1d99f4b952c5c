//! Raw recognizer output for one diagram and its conversion into a
//! [`PerceptionBundle`].

use serde::{Deserialize, Serialize};

use pidgraph_core::{ConfigError, PerceptionBundle};

use crate::lines::{build_lines, LineSegment};
use crate::ocr::{build_texts, OcrPolicy, OcrWord};
use crate::symbols::{build_symbols, SymbolCandidate, SymbolPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub symbols: SymbolPolicy,
    pub ocr: OcrPolicy,
}

impl PerceptionConfig {
    pub fn check(&self) -> Result<(), ConfigError> {
        let unit = [
            ("perception.symbols.min_score", self.symbols.min_score),
            ("perception.symbols.low_score_warning", self.symbols.low_score_warning),
            ("perception.symbols.nms_overlap", self.symbols.nms_overlap),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        let c = self.ocr.min_confidence;
        if !(0.0..=100.0).contains(&c) {
            return Err(ConfigError::Invalid(format!(
                "perception.ocr.min_confidence must lie in [0, 100], got {c}"
            )));
        }
        Ok(())
    }
}

/// Unprocessed detector, line finder and OCR output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPerception {
    pub symbols: Vec<SymbolCandidate>,
    pub segments: Vec<LineSegment>,
    pub words: Vec<OcrWord>,
}

impl RawPerception {
    pub fn to_bundle(&self, config: &PerceptionConfig) -> PerceptionBundle {
        PerceptionBundle {
            symbols: build_symbols(&self.symbols, &config.symbols),
            lines: build_lines(&self.segments),
            texts: build_texts(&self.words, &config.ocr),
        }
    }
}
