//! OCR words → text primitives.

use serde::{Deserialize, Serialize};

use pidgraph_core::{BoundingBox, Text};

/// One recognized word. `confidence` is on the engine's 0–100 scale; engines
/// report `-1` for layout-only rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrPolicy {
    /// Words must score strictly above this.
    pub min_confidence: f64,
}

impl Default for OcrPolicy {
    fn default() -> Self {
        Self { min_confidence: 60.0 }
    }
}

/// Keep confident, non-blank words. Ids use the raw word index, so gaps are
/// expected.
pub fn build_texts(words: &[OcrWord], policy: &OcrPolicy) -> Vec<Text> {
    let texts: Vec<Text> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| w.confidence > policy.min_confidence && !w.text.trim().is_empty())
        .map(|(i, w)| Text::new(format!("text_{i}"), w.text.clone(), w.bbox))
        .collect();
    tracing::debug!(words = words.len(), kept = texts.len(), "built texts");
    texts
}

/// Mean confidence over rows with a real score (`>= 0`); 0 for none.
pub fn mean_confidence(words: &[OcrWord]) -> f64 {
    let scores: Vec<f64> = words
        .iter()
        .map(|w| w.confidence)
        .filter(|c| *c >= 0.0)
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Map a box from an image rotated 90° counter-clockwise back to the
/// original frame. `rotated_width` is the width of the rotated image.
pub fn unrotate_bbox(b: BoundingBox, rotated_width: i64) -> BoundingBox {
    BoundingBox::new(b.y, rotated_width - (b.x + b.w), b.h, b.w)
}

/// Pick between an upright pass and a 90°-rotated pass of the same page.
///
/// The rotated pass wins only on strictly higher mean confidence; its boxes
/// are mapped back to the upright frame before filtering.
pub fn build_texts_oriented(
    upright: &[OcrWord],
    rotated: &[OcrWord],
    rotated_width: i64,
    policy: &OcrPolicy,
) -> Vec<Text> {
    if mean_confidence(rotated) > mean_confidence(upright) {
        tracing::debug!("using rotated OCR pass");
        let words: Vec<OcrWord> = rotated
            .iter()
            .map(|w| OcrWord {
                bbox: unrotate_bbox(w.bbox, rotated_width),
                ..w.clone()
            })
            .collect();
        build_texts(&words, policy)
    } else {
        build_texts(upright, policy)
    }
}
