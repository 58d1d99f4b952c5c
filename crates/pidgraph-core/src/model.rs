//! Process graph data model.
//!
//! These are the typed records exchanged between perception stages, the
//! assembler, the validator and the exporters. Wire names follow the JSON
//! documents the rest of the tooling already reads (`type`, `targetId`, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open attribute bag carried by nodes and edges.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Integer 2D point in image pixel coordinates.
pub type Point = (i64, i64);

// ============================================================================
// Geometry primitives
// ============================================================================

/// Axis-aligned box: top-left corner plus width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// Square box of `2 * half` pixels centred on `p`.
    pub fn around(p: Point, half: i64) -> Self {
        Self {
            x: p.0 - half,
            y: p.1 - half,
            w: 2 * half,
            h: 2 * half,
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Equipment,
    Instrument,
    Junction,
    Unknown,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Equipment => "equipment",
            NodeKind::Instrument => "instrument",
            NodeKind::Junction => "junction",
            NodeKind::Unknown => "unknown",
        }
    }

    /// Detected physical symbol (as opposed to a synthesized junction).
    pub fn is_symbol(&self) -> bool {
        matches!(self, NodeKind::Equipment | NodeKind::Instrument)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected symbol or a synthesized line junction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Symbol class name, e.g. `pump`.
    #[serde(rename = "type", default)]
    pub symbol_type: Option<String>,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Node {
    pub fn symbol(
        id: impl Into<String>,
        kind: NodeKind,
        symbol_type: impl Into<String>,
        bbox: BoundingBox,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            symbol_type: Some(symbol_type.into()),
            bbox,
            tag: None,
            attributes: Attributes::new(),
            confidence: Some(confidence),
        }
    }

    pub fn junction(id: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Junction,
            symbol_type: None,
            bbox,
            tag: None,
            attributes: Attributes::new(),
            confidence: None,
        }
    }
}

// ============================================================================
// Edges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Process,
    Signal,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Process => "process",
            EdgeKind::Signal => "signal",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "a->b")]
    AToB,
    #[serde(rename = "b->a")]
    BToA,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Unknown => "unknown",
            Direction::AToB => "a->b",
            Direction::BToA => "b->a",
        }
    }
}

/// `(start node id, end node id)`; `None` while unresolved.
pub type Endpoints = (Option<String>, Option<String>);

/// A line segment between two (possibly unresolved) nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub kind: EdgeKind,
    pub polyline: Vec<Point>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Edge {
    /// A freshly extracted straight line with both endpoints unresolved.
    pub fn line(id: impl Into<String>, kind: EdgeKind, start: Point, end: Point) -> Self {
        Self {
            id: id.into(),
            kind,
            polyline: vec![start, end],
            direction: Direction::Unknown,
            endpoints: (None, None),
            label: None,
            attributes: Attributes::new(),
            confidence: None,
        }
    }

    /// First polyline vertex. Panics on an empty polyline.
    pub fn start(&self) -> Point {
        self.polyline[0]
    }

    /// Last polyline vertex. Panics on an empty polyline.
    pub fn end(&self) -> Point {
        self.polyline[self.polyline.len() - 1]
    }

    pub fn is_connected(&self) -> bool {
        self.endpoints.0.is_some() && self.endpoints.1.is_some()
    }
}

// ============================================================================
// OCR text
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Text {
    pub id: String,
    pub content: String,
    pub bbox: BoundingBox,
}

impl Text {
    pub fn new(id: impl Into<String>, content: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            bbox,
        }
    }
}

// ============================================================================
// Issues
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    /// Node/edge the issue is about; `None` for diagram-wide issues.
    #[serde(rename = "targetId", default)]
    pub target_id: Option<String>,
}

impl Issue {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        target_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            target_id,
        }
    }
}

// ============================================================================
// Graph
// ============================================================================

/// The assembled process graph for one diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Every OCR detection, assigned or not.
    #[serde(default)]
    pub texts: Vec<Text>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn issues_for<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues
            .iter()
            .filter(move |i| i.target_id.as_deref() == Some(target))
    }
}

// ============================================================================
// Parsed instrument tag
// ============================================================================

/// Structured ISA-5.1 style instrument tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentTag {
    #[serde(rename = "rawTag")]
    pub raw_tag: String,
    #[serde(rename = "loopLetters")]
    pub loop_letters: Option<String>,
    #[serde(rename = "loopNo")]
    pub loop_no: Option<u32>,
    pub modifiers: Option<Vec<String>>,
    #[serde(rename = "isParsed")]
    pub is_parsed: bool,
}

impl InstrumentTag {
    pub fn unparsed(raw: &str) -> Self {
        Self {
            raw_tag: raw.to_string(),
            loop_letters: None,
            loop_no: None,
            modifiers: None,
            is_parsed: false,
        }
    }
}

// ============================================================================
// Perception-stage contracts
// ============================================================================

/// Output of a symbol detector: nodes plus any issues it wants surfaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolDetection {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Output of the line extractor: unresolved edges and terminus junctions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineExtraction {
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub junctions: Vec<Node>,
}
