//! Stage pipeline: perception bundle → assembled, tagged, validated graph.
//!
//! Every stage takes the previous `Graph` by value and returns the next
//! snapshot; nothing is shared between runs, so distinct diagrams can be
//! processed concurrently.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assemble::{check_inputs, Assembler, InputError};
use crate::config::PipelineConfig;
use crate::model::{Graph, LineExtraction, NodeKind, SymbolDetection, Text};
use crate::tagging::annotate_tags;
use crate::validate::{IssueCounts, Validator};

/// Caller-supplied identifier for one diagram analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiagramId(String);

impl DiagramId {
    pub fn new(id: impl Into<String>) -> Result<Self, InputError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InputError::EmptyDiagramId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DiagramId {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiagramId> for String {
    fn from(id: DiagramId) -> Self {
        id.0
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the perception stages produced for one diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionBundle {
    #[serde(default)]
    pub symbols: SymbolDetection,
    #[serde(default)]
    pub lines: LineExtraction,
    #[serde(default)]
    pub texts: Vec<Text>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub equipment: usize,
    pub instruments: usize,
    pub junctions: usize,
    pub edges: usize,
    pub connected_edges: usize,
    pub texts: usize,
    pub issues: IssueCounts,
}

impl GraphSummary {
    pub fn of(graph: &Graph) -> Self {
        let count = |kind: NodeKind| graph.nodes.iter().filter(|n| n.kind == kind).count();
        Self {
            equipment: count(NodeKind::Equipment),
            instruments: count(NodeKind::Instrument),
            junctions: count(NodeKind::Junction),
            edges: graph.edges.len(),
            connected_edges: graph.edges.iter().filter(|e| e.is_connected()).count(),
            texts: graph.texts.len(),
            issues: IssueCounts::of(&graph.issues),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub diagram_id: DiagramId,
    pub graph: Graph,
    pub summary: GraphSummary,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    assembler: Assembler,
    validator: Validator,
    annotate_tags: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            assembler: Assembler::new(config.assembly),
            validator: Validator::new(config.validation),
            annotate_tags: config.annotate_tags,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Run assembly, tag annotation and validation for one diagram.
    ///
    /// The final `graph.issues` holds the perception issues followed by the
    /// validator's issues.
    pub fn run(
        &self,
        diagram_id: &DiagramId,
        bundle: PerceptionBundle,
    ) -> Result<Analysis, InputError> {
        let PerceptionBundle { symbols, lines, texts } = bundle;
        check_inputs(&symbols.nodes, &lines.edges, &lines.junctions, &texts)?;

        let graph = self
            .assembler
            .assemble(symbols.nodes, lines.edges, lines.junctions, texts);
        let mut graph = if self.annotate_tags {
            annotate_tags(graph)
        } else {
            graph
        };

        let validation = self.validator.validate(&mut graph);
        let mut issues = symbols.issues;
        issues.extend(validation);
        graph.issues = issues;

        let summary = GraphSummary::of(&graph);
        tracing::info!(
            diagram = %diagram_id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            connected = summary.connected_edges,
            issues = graph.issues.len(),
            "analyzed diagram"
        );

        Ok(Analysis {
            diagram_id: diagram_id.clone(),
            graph,
            summary,
        })
    }
}
