//! Symbol candidates → symbol nodes.
//!
//! Detectors (template matching, neural detectors) produce scored boxes per
//! class. This module filters and de-duplicates them and decides node kinds.

use serde::{Deserialize, Serialize};

use pidgraph_core::geometry::overlap_ratio;
use pidgraph_core::{BoundingBox, Issue, Node, NodeKind, Severity, SymbolDetection};

/// One raw detection: class name, box and score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCandidate {
    pub class_name: String,
    pub bbox: BoundingBox,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolPolicy {
    /// Candidates scoring below this are dropped.
    pub min_score: f64,
    /// Kept symbols scoring below this get an info issue.
    pub low_score_warning: f64,
    /// NMS suppression threshold (overlap fraction of the weaker box).
    pub nms_overlap: f64,
    pub equipment_classes: Vec<String>,
    pub instrument_classes: Vec<String>,
}

impl Default for SymbolPolicy {
    fn default() -> Self {
        let names = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            min_score: 0.5,
            low_score_warning: 0.7,
            nms_overlap: 0.4,
            equipment_classes: names(&[
                "pump",
                "tank",
                "valve_manual",
                "valve_control",
                "heat_exchanger",
                "compressor",
                "filter",
                "separator",
                "reactor",
            ]),
            instrument_classes: names(&["instrument_bubble"]),
        }
    }
}

impl SymbolPolicy {
    pub fn kind_of(&self, class_name: &str) -> NodeKind {
        if self.equipment_classes.iter().any(|c| c == class_name) {
            NodeKind::Equipment
        } else if self.instrument_classes.iter().any(|c| c == class_name) {
            NodeKind::Instrument
        } else {
            NodeKind::Unknown
        }
    }
}

/// Greedy non-maximum suppression. Returns kept indices, best score first.
///
/// Equal scores keep input order.
pub fn non_max_suppression(boxes: &[BoundingBox], scores: &[f64], overlap: f64) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len());

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];
    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);
        for &j in &order[pos + 1..] {
            if !suppressed[j] && overlap_ratio(&boxes[i], &boxes[j]) > overlap {
                suppressed[j] = true;
            }
        }
    }
    keep
}

/// Filter, suppress and classify candidates into symbol nodes.
pub fn build_symbols(candidates: &[SymbolCandidate], policy: &SymbolPolicy) -> SymbolDetection {
    let kept: Vec<&SymbolCandidate> = candidates
        .iter()
        .filter(|c| c.score >= policy.min_score)
        .collect();
    let boxes: Vec<BoundingBox> = kept.iter().map(|c| c.bbox).collect();
    let scores: Vec<f64> = kept.iter().map(|c| c.score).collect();
    let picked = non_max_suppression(&boxes, &scores, policy.nms_overlap);

    let mut out = SymbolDetection::default();
    for (i, &idx) in picked.iter().enumerate() {
        let c = kept[idx];
        let kind = policy.kind_of(&c.class_name);
        let node = Node::symbol(format!("symbol_{i}"), kind, c.class_name.clone(), c.bbox, c.score);

        if c.score < policy.low_score_warning {
            let id = format!("detection_issue_{}", out.issues.len());
            out.issues.push(Issue::new(
                id,
                Severity::Info,
                format!("Low confidence detection ({:.2}) for {}", c.score, c.class_name),
                Some(node.id.clone()),
            ));
        }
        if kind == NodeKind::Unknown {
            let id = format!("detection_issue_{}", out.issues.len());
            out.issues.push(Issue::new(
                id,
                Severity::Warn,
                format!("Unrecognized symbol class '{}'", c.class_name),
                Some(node.id.clone()),
            ));
        }
        out.nodes.push(node);
    }

    tracing::debug!(
        candidates = candidates.len(),
        above_threshold = kept.len(),
        symbols = out.nodes.len(),
        "built symbol nodes"
    );
    out
}
