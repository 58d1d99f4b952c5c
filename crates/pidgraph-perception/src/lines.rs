//! Straight line segments → process edges and terminus junctions.

use serde::{Deserialize, Serialize};

use pidgraph_core::{BoundingBox, Edge, EdgeKind, LineExtraction, Node, Point};

/// Half extent of the square junction box placed at each segment end.
pub const JUNCTION_HALF_SIZE: i64 = 2;

/// A detected segment, e.g. one probabilistic Hough line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

impl From<(i64, i64, i64, i64)> for LineSegment {
    fn from((x1, y1, x2, y2): (i64, i64, i64, i64)) -> Self {
        Self::new((x1, y1), (x2, y2))
    }
}

/// One process edge per segment plus a junction at both of its ends.
///
/// Line type is not classified here; every edge is `process` with unresolved
/// endpoints and unknown direction.
pub fn build_lines(segments: &[LineSegment]) -> LineExtraction {
    let mut out = LineExtraction::default();
    for (i, seg) in segments.iter().enumerate() {
        out.edges
            .push(Edge::line(format!("line_{i}"), EdgeKind::Process, seg.start, seg.end));
        for p in [seg.start, seg.end] {
            let id = format!("jct_{}", out.junctions.len());
            out.junctions
                .push(Node::junction(id, BoundingBox::around(p, JUNCTION_HALF_SIZE)));
        }
    }
    tracing::debug!(
        edges = out.edges.len(),
        junctions = out.junctions.len(),
        "built line extraction"
    );
    out
}
