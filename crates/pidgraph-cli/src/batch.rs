//! Analyze every perception file under a directory in parallel.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use pidgraph_core::{DiagramId, GraphSummary, Pipeline};
use pidgraph_perception::PerceptionConfig;

use crate::io::{load_bundle, write_json};

pub const BUNDLE_SUFFIX: &str = ".perception.json";
pub const RAW_SUFFIX: &str = ".raw.json";

/// One input file and the diagram id derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    pub path: PathBuf,
    pub diagram_id: String,
    pub raw: bool,
}

/// `sheet-1.perception.json` → `sheet-1`; `sheet-1.raw.json` → raw input `sheet-1`.
fn classify(path: &Path) -> Option<BatchInput> {
    let name = path.file_name()?.to_str()?;
    let (stem, raw) = if let Some(stem) = name.strip_suffix(BUNDLE_SUFFIX) {
        (stem, false)
    } else {
        (name.strip_suffix(RAW_SUFFIX)?, true)
    };
    if stem.trim().is_empty() {
        return None;
    }
    Some(BatchInput {
        path: path.to_path_buf(),
        diagram_id: stem.to_string(),
        raw,
    })
}

/// Inputs sorted by path so output order does not depend on the filesystem.
///
/// Each diagram id names one output file, so two inputs mapping to the same
/// id are rejected.
pub fn discover(input_dir: &Path) -> Result<Vec<BatchInput>> {
    let mut inputs = Vec::new();
    for entry in WalkDir::new(input_dir) {
        let entry = entry.with_context(|| format!("walking {}", input_dir.display()))?;
        if entry.file_type().is_file() {
            if let Some(input) = classify(entry.path()) {
                inputs.push(input);
            }
        }
    }
    inputs.sort_by(|a, b| a.path.cmp(&b.path));

    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for input in &inputs {
        if let Some(first) = seen.insert(&input.diagram_id, &input.path) {
            return Err(anyhow!(
                "diagram id `{}` is produced by both {} and {}",
                input.diagram_id,
                first.display(),
                input.path.display()
            ));
        }
    }
    Ok(inputs)
}

fn analyze_one(
    input: &BatchInput,
    pipeline: &Pipeline,
    perception: &PerceptionConfig,
    out_dir: &Path,
) -> Result<GraphSummary> {
    let id = DiagramId::new(input.diagram_id.clone())?;
    let bundle = load_bundle(&input.path, input.raw, perception)?;
    let analysis = pipeline.run(&id, bundle)?;
    let out = out_dir.join(format!("{id}.graph.json"));
    write_json(&analysis, Some(&out))?;
    Ok(analysis.summary)
}

pub fn cmd_batch(
    input_dir: &Path,
    out_dir: &Path,
    pipeline: &Pipeline,
    perception: &PerceptionConfig,
) -> Result<()> {
    let inputs = discover(input_dir)?;
    if inputs.is_empty() {
        return Err(anyhow!(
            "no *{BUNDLE_SUFFIX} or *{RAW_SUFFIX} files under {}",
            input_dir.display()
        ));
    }
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    tracing::info!(files = inputs.len(), "starting batch");
    let results: Vec<(&BatchInput, Result<GraphSummary>)> = inputs
        .par_iter()
        .map(|input| (input, analyze_one(input, pipeline, perception, out_dir)))
        .collect();

    let mut failed = 0usize;
    for (input, result) in &results {
        match result {
            Ok(s) => println!(
                "  {} {} edges={} connected={} issues={}",
                "ok".green().bold(),
                input.diagram_id,
                s.edges,
                s.connected_edges,
                s.issues.error + s.issues.warn + s.issues.info
            ),
            Err(err) => {
                failed += 1;
                println!("  {} {}: {err:#}", "failed".red().bold(), input.diagram_id);
            }
        }
    }

    println!(
        "{} {} of {} diagram(s) into {}",
        "wrote".green().bold(),
        results.len() - failed,
        results.len(),
        out_dir.display()
    );
    if failed > 0 {
        return Err(anyhow!("{failed} diagram(s) failed"));
    }
    Ok(())
}
