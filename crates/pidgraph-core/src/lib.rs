//! Pidgraph core: process graphs from P&ID perception output.
//!
//! Perception stages (symbol detection, line extraction, OCR) hand over typed
//! primitives. This crate turns them into one labelled, connected graph,
//! parses instrument tags, checks the result and projects it into export
//! formats:
//!
//! ```text
//! symbols ─┐
//! lines ───┼─► assemble ─► annotate_tags ─► validate ─► export / query
//! junctions┤
//! texts ───┘
//! ```
//!
//! Everything here is synchronous, in-memory and free of process-wide state.

pub mod assemble;
pub mod config;
pub mod export;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod tagging;
pub mod validate;

pub use assemble::{assemble, check_graph, check_inputs, Assembler, InputError};
pub use config::{AssemblyConfig, ConfigError, PipelineConfig, ValidationConfig};
pub use export::{to_interchange_json, to_tabular_export, DexpiExport, ExportError, TabularExport};
pub use model::*;
pub use pipeline::{Analysis, DiagramId, GraphSummary, PerceptionBundle, Pipeline};
pub use tagging::{annotate_tags, parse_tag, PARSED_TAG_ATTR};
pub use validate::{validate, IssueCounts, Validator};
