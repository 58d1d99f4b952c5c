//! Read-only projections of a graph into interchange formats.
//!
//! - DEXPI-lite JSON: equipment / instruments / lines / connections / issues
//! - tabular CSV: one table for nodes, one for edges

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, Graph, Issue, NodeKind, Point};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

// ============================================================================
// DEXPI-lite
// ============================================================================

/// Equipment or instrument entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexpiItem {
    pub id: String,
    /// Placeholder for a DEXPI / ISO 15926 class mapping.
    #[serde(rename = "classRef")]
    pub class_ref: String,
    pub bbox: BoundingBox,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexpiLine {
    pub id: String,
    #[serde(rename = "classRef")]
    pub class_ref: String,
    pub polyline: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexpiConnection {
    pub from_node: String,
    pub to_node: String,
    pub line_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DexpiExport {
    pub equipment: Vec<DexpiItem>,
    pub instruments: Vec<DexpiItem>,
    pub lines: Vec<DexpiLine>,
    pub connections: Vec<DexpiConnection>,
    pub issues: Vec<Issue>,
}

fn class_ref(name: Option<&str>) -> String {
    format!("placeholder/{}", name.unwrap_or("unknown"))
}

impl DexpiExport {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut out = DexpiExport::default();

        for node in &graph.nodes {
            let item = || DexpiItem {
                id: node.id.clone(),
                class_ref: class_ref(node.symbol_type.as_deref()),
                bbox: node.bbox,
                tag: node.tag.clone(),
            };
            match node.kind {
                NodeKind::Equipment => out.equipment.push(item()),
                NodeKind::Instrument => out.instruments.push(item()),
                NodeKind::Junction | NodeKind::Unknown => {}
            }
        }

        for edge in &graph.edges {
            out.lines.push(DexpiLine {
                id: edge.id.clone(),
                class_ref: format!("placeholder/{}_line", edge.kind),
                polyline: edge.polyline.clone(),
            });
            if let (Some(from), Some(to)) = &edge.endpoints {
                out.connections.push(DexpiConnection {
                    from_node: from.clone(),
                    to_node: to.clone(),
                    line_id: edge.id.clone(),
                });
            }
        }

        out.issues = graph.issues.clone();
        out
    }
}

/// Pretty-printed DEXPI-lite document.
pub fn to_interchange_json(graph: &Graph) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&DexpiExport::from_graph(graph))?)
}

// ============================================================================
// Tabular
// ============================================================================

pub const NODE_COLUMNS: [&str; 9] = [
    "id", "kind", "type", "tag", "confidence", "bbox_x", "bbox_y", "bbox_w", "bbox_h",
];

pub const EDGE_COLUMNS: [&str; 6] = ["id", "kind", "label", "direction", "from_node", "to_node"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularExport {
    pub nodes: String,
    pub edges: String,
}

fn opt(s: &Option<String>) -> String {
    s.clone().unwrap_or_default()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Node and edge tables; missing values become empty fields.
pub fn to_tabular_export(graph: &Graph) -> Result<TabularExport, ExportError> {
    let mut nodes = csv::Writer::from_writer(Vec::new());
    nodes.write_record(NODE_COLUMNS)?;
    for node in &graph.nodes {
        nodes.write_record([
            node.id.clone(),
            node.kind.to_string(),
            opt(&node.symbol_type),
            opt(&node.tag),
            node.confidence.map(|c| c.to_string()).unwrap_or_default(),
            node.bbox.x.to_string(),
            node.bbox.y.to_string(),
            node.bbox.w.to_string(),
            node.bbox.h.to_string(),
        ])?;
    }

    let mut edges = csv::Writer::from_writer(Vec::new());
    edges.write_record(EDGE_COLUMNS)?;
    for edge in &graph.edges {
        edges.write_record([
            edge.id.clone(),
            edge.kind.to_string(),
            opt(&edge.label),
            edge.direction.as_str().to_string(),
            opt(&edge.endpoints.0),
            opt(&edge.endpoints.1),
        ])?;
    }

    Ok(TabularExport {
        nodes: finish(nodes)?,
        edges: finish(edges)?,
    })
}
