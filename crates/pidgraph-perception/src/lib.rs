//! Perception-stage contracts for pidgraph.
//!
//! Image-level recognizers (template matchers, neural detectors, Hough line
//! finders, OCR engines) live outside this crate. What lives here is the
//! deterministic post-processing that turns their raw output into the typed
//! primitives `pidgraph-core` assembles:
//!
//! - [`symbols`]: score filtering, non-maximum suppression, class → node kind
//! - [`lines`]: segments → process edges plus terminus junctions
//! - [`ocr`]: confidence filtering and orientation choice for OCR words
//! - [`detector`]: ordered fallback chain of symbol detection strategies
//! - [`raw`]: all of the above for one diagram at once

pub mod detector;
pub mod lines;
pub mod ocr;
pub mod raw;
pub mod symbols;

pub use detector::{
    ChainOutcome, DetectionError, DetectorChain, SidecarDetector, StrategyFailure, SymbolDetector,
};
pub use lines::{build_lines, LineSegment, JUNCTION_HALF_SIZE};
pub use ocr::{build_texts, build_texts_oriented, OcrPolicy, OcrWord};
pub use raw::{PerceptionConfig, RawPerception};
pub use symbols::{build_symbols, non_max_suppression, SymbolCandidate, SymbolPolicy};
