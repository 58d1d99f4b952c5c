//! Structural checks over an assembled graph.
//!
//! Rules run independently per element, so one edge may produce several
//! issues:
//!
//! | rule | severity | condition |
//! |------|----------|-----------|
//! | missing label | warn | process edge without a label |
//! | dangling start / end | warn | unresolved edge endpoint |
//! | low confidence | info | equipment/instrument below the confidence threshold |
//! | self loop | warn | both ends on one node (opt-in) |
//!
//! Issue ids restart at `issue_0` on every run.

use crate::config::ValidationConfig;
use crate::model::{EdgeKind, Graph, Issue, Severity};

#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

struct IssueSink {
    issues: Vec<Issue>,
}

impl IssueSink {
    fn push(&mut self, severity: Severity, message: String, target: &str) {
        let id = format!("issue_{}", self.issues.len());
        self.issues
            .push(Issue::new(id, severity, message, Some(target.to_string())));
    }
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Compute issues without touching the graph.
    pub fn check(&self, graph: &Graph) -> Vec<Issue> {
        let mut sink = IssueSink { issues: Vec::new() };

        for edge in &graph.edges {
            let unlabelled = edge.label.as_deref().map_or(true, str::is_empty);
            if edge.kind == EdgeKind::Process && unlabelled {
                sink.push(
                    Severity::Warn,
                    "Process line is missing a label/tag.".to_string(),
                    &edge.id,
                );
            }
        }

        for edge in &graph.edges {
            if edge.endpoints.0.is_none() {
                sink.push(
                    Severity::Warn,
                    "Line has a dangling start point (not connected to any node).".to_string(),
                    &edge.id,
                );
            }
            if edge.endpoints.1.is_none() {
                sink.push(
                    Severity::Warn,
                    "Line has a dangling end point (not connected to any node).".to_string(),
                    &edge.id,
                );
            }
        }

        for node in &graph.nodes {
            if !node.kind.is_symbol() {
                continue;
            }
            let Some(confidence) = node.confidence else {
                continue;
            };
            if confidence < self.config.low_confidence_threshold {
                sink.push(
                    Severity::Info,
                    format!(
                        "Low confidence symbol match ({:.2}) for '{}'.",
                        confidence,
                        node.symbol_type.as_deref().unwrap_or("unknown")
                    ),
                    &node.id,
                );
            }
        }

        if self.config.flag_self_loops {
            for edge in &graph.edges {
                if let (Some(a), Some(b)) = &edge.endpoints {
                    if a == b {
                        sink.push(
                            Severity::Warn,
                            format!("Line starts and ends on the same node '{a}'."),
                            &edge.id,
                        );
                    }
                }
            }
        }

        sink.issues
    }

    /// Replace `graph.issues` with a fresh run and return the issues.
    pub fn validate(&self, graph: &mut Graph) -> Vec<Issue> {
        let issues = self.check(graph);
        tracing::debug!(issues = issues.len(), "validated graph");
        graph.issues = issues.clone();
        issues
    }
}

/// Validate with the default rule set.
pub fn validate(graph: &mut Graph) -> Vec<Issue> {
    Validator::default().validate(graph)
}

/// Per-severity tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IssueCounts {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
}

impl IssueCounts {
    pub fn of(issues: &[Issue]) -> Self {
        let mut c = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Error => c.error += 1,
                Severity::Warn => c.warn += 1,
                Severity::Info => c.info += 1,
            }
        }
        c
    }
}
