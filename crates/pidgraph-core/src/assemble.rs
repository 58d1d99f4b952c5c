//! Graph assembly: text association and line-end resolution.
//!
//! Perception stages hand over independent, unordered primitives. Assembly
//! turns them into one graph in a fixed order:
//!
//! 1. nodes = symbols ++ junctions
//! 2. each node (in order) takes the nearest unassigned text within
//!    `node_text_radius` of its centre
//! 3. each edge (in order) takes the nearest remaining text within
//!    `edge_text_radius` of the midpoint of its first and last vertex
//! 4. each edge end snaps to the globally nearest node centre, kept only
//!    when closer than `endpoint_snap_radius`
//!
//! A text is consumed by at most one node or edge. `Graph::texts` still
//! carries every detection.

use std::collections::HashSet;

use crate::config::AssemblyConfig;
use crate::geometry::{bbox_center, distance, midpoint, nearest_within, to_f, PointF};
use crate::model::{Edge, Graph, Node, Text};

/// Precondition violations in perception output or a loaded graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),
    #[error("duplicate edge id `{0}`")]
    DuplicateEdgeId(String),
    #[error("duplicate text id `{0}`")]
    DuplicateTextId(String),
    #[error("edge `{id}` has {points} polyline point(s); at least 2 are required")]
    ShortPolyline { id: String, points: usize },
    #[error("edge `{edge}` references unknown node `{node}`")]
    UnknownEndpoint { edge: String, node: String },
    #[error("node `{id}` has confidence {confidence}; expected a value in [0, 1]")]
    ConfidenceOutOfRange { id: String, confidence: f64 },
    #[error("diagram id must not be empty")]
    EmptyDiagramId,
}

/// Reject inputs the assembler must never see.
pub fn check_inputs(
    symbols: &[Node],
    lines: &[Edge],
    junctions: &[Node],
    texts: &[Text],
) -> Result<(), InputError> {
    let mut seen = HashSet::new();
    for node in symbols.iter().chain(junctions) {
        if !seen.insert(node.id.as_str()) {
            return Err(InputError::DuplicateNodeId(node.id.clone()));
        }
        if let Some(confidence) = node.confidence.filter(|c| !(0.0..=1.0).contains(c)) {
            return Err(InputError::ConfidenceOutOfRange {
                id: node.id.clone(),
                confidence,
            });
        }
    }

    let mut seen = HashSet::new();
    for edge in lines {
        if !seen.insert(edge.id.as_str()) {
            return Err(InputError::DuplicateEdgeId(edge.id.clone()));
        }
        if edge.polyline.len() < 2 {
            return Err(InputError::ShortPolyline {
                id: edge.id.clone(),
                points: edge.polyline.len(),
            });
        }
    }

    let mut seen = HashSet::new();
    for text in texts {
        if !seen.insert(text.id.as_str()) {
            return Err(InputError::DuplicateTextId(text.id.clone()));
        }
    }
    Ok(())
}

/// Structural check for a graph read back from disk.
pub fn check_graph(graph: &Graph) -> Result<(), InputError> {
    check_inputs(&graph.nodes, &graph.edges, &[], &graph.texts)?;

    let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &graph.edges {
        for node in [&edge.endpoints.0, &edge.endpoints.1].into_iter().flatten() {
            if !ids.contains(node.as_str()) {
                return Err(InputError::UnknownEndpoint {
                    edge: edge.id.clone(),
                    node: node.clone(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: AssemblyConfig,
}

impl Assembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Build the graph from perception outputs.
    ///
    /// Inputs are assumed to satisfy [`check_inputs`]. Panics if an edge has
    /// fewer than two polyline points.
    pub fn assemble(
        &self,
        symbols: Vec<Node>,
        lines: Vec<Edge>,
        junctions: Vec<Node>,
        texts: Vec<Text>,
    ) -> Graph {
        let mut nodes = symbols;
        nodes.extend(junctions);
        let mut edges = lines;

        for edge in &edges {
            assert!(
                edge.polyline.len() >= 2,
                "edge `{}` has {} polyline point(s)",
                edge.id,
                edge.polyline.len()
            );
        }

        let text_centers: Vec<PointF> = texts.iter().map(|t| bbox_center(&t.bbox)).collect();
        // Indices into `texts` still available, in detection order.
        let mut pool: Vec<usize> = (0..texts.len()).collect();

        let mut tagged = 0usize;
        for node in nodes.iter_mut() {
            let center = bbox_center(&node.bbox);
            let radius = self.config.node_text_radius;
            if let Some(ti) = take_nearest(&mut pool, &text_centers, center, radius) {
                node.tag = Some(texts[ti].content.clone());
                tagged += 1;
            }
        }

        let mut labelled = 0usize;
        for edge in edges.iter_mut() {
            let mid = midpoint(edge.start(), edge.end());
            let radius = self.config.edge_text_radius;
            if let Some(ti) = take_nearest(&mut pool, &text_centers, mid, radius) {
                edge.label = Some(texts[ti].content.clone());
                labelled += 1;
            }
        }

        let node_centers: Vec<PointF> = nodes.iter().map(|n| bbox_center(&n.bbox)).collect();
        let mut snapped = 0usize;
        for edge in edges.iter_mut() {
            if let Some(i) = self.snap(to_f(edge.start()), &node_centers) {
                edge.endpoints.0 = Some(nodes[i].id.clone());
                snapped += 1;
            }
            if let Some(i) = self.snap(to_f(edge.end()), &node_centers) {
                edge.endpoints.1 = Some(nodes[i].id.clone());
                snapped += 1;
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            texts = texts.len(),
            tagged,
            labelled,
            snapped,
            "assembled graph"
        );

        Graph {
            nodes,
            edges,
            issues: Vec::new(),
            texts,
        }
    }

    /// Nearest node overall, accepted only inside the snap radius.
    fn snap(&self, point: PointF, node_centers: &[PointF]) -> Option<usize> {
        let (i, _) = nearest_within(point, node_centers.iter().copied(), f64::INFINITY)?;
        (distance(point, node_centers[i]) < self.config.endpoint_snap_radius).then_some(i)
    }
}

/// Remove and return the nearest pooled text strictly within `radius`.
fn take_nearest(
    pool: &mut Vec<usize>,
    centers: &[PointF],
    origin: PointF,
    radius: f64,
) -> Option<usize> {
    let (slot, _) = nearest_within(origin, pool.iter().map(|&i| centers[i]), radius)?;
    Some(pool.remove(slot))
}

/// Assemble with the default radii.
pub fn assemble(
    symbols: Vec<Node>,
    lines: Vec<Edge>,
    junctions: Vec<Node>,
    texts: Vec<Text>,
) -> Graph {
    Assembler::default().assemble(symbols, lines, junctions, texts)
}
