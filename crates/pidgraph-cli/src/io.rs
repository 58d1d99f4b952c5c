//! File loading shared by the subcommands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use pidgraph_core::{Analysis, Graph, PerceptionBundle, PipelineConfig};
use pidgraph_perception::{PerceptionConfig, RawPerception};

/// A graph file is either an `analyze` result (it carries `diagram_id`) or a
/// bare graph.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    if value.get("diagram_id").is_some() {
        let analysis: Analysis = serde_json::from_value(value)
            .with_context(|| format!("parsing analysis {}", path.display()))?;
        Ok(analysis.graph)
    } else {
        serde_json::from_value(value).with_context(|| format!("parsing graph {}", path.display()))
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PerceptionSection {
    perception: PerceptionConfig,
}

/// Pipeline thresholds plus the optional `perception` section of the same file.
pub struct CliConfig {
    pub pipeline: PipelineConfig,
    pub perception: PerceptionConfig,
}

pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig {
            pipeline: PipelineConfig::default(),
            perception: PerceptionConfig::default(),
        });
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let pipeline = PipelineConfig::from_json_str(&text)
        .with_context(|| format!("config {}", path.display()))?;
    let section: PerceptionSection =
        serde_json::from_str(&text).with_context(|| format!("config {}", path.display()))?;
    section.perception.check()?;
    Ok(CliConfig {
        pipeline,
        perception: section.perception,
    })
}

/// Perception input: a ready bundle, or raw recognizer output when `raw`.
pub fn load_bundle(path: &Path, raw: bool, config: &PerceptionConfig) -> Result<PerceptionBundle> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if raw {
        let raw: RawPerception =
            serde_json::from_str(&text).with_context(|| {
                format!("parsing raw perception {}", path.display())
            })?;
        Ok(raw.to_bundle(config))
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("parsing perception bundle {}", path.display()))
    }
}

pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
