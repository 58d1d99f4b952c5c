//! Pidgraph CLI
//!
//! - `analyze`: perception output → validated graph
//! - `validate`: re-run the validator over a stored graph
//! - `export`: DEXPI-lite JSON or CSV tables
//! - `query`: ask a question about a stored graph
//! - `tag`: parse one instrument tag
//! - `batch`: analyze a directory of diagrams in parallel

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use pidgraph_core::{
    check_graph, parse_tag, to_interchange_json, to_tabular_export, DiagramId, IssueCounts,
    Pipeline, Validator,
};
use pidgraph_query::{KnowledgeBase, QueryService, RetrievalConfig, Retriever, TokenHashEmbedder};

mod batch;
mod io;
mod report;

#[derive(Parser)]
#[command(name = "pidgraph")]
#[command(author, version, about = "Pidgraph: process graphs from P&ID perception output")]
struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Dexpi,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble, tag and validate one diagram.
    Analyze {
        /// Caller-chosen identifier for this diagram
        #[arg(long)]
        diagram_id: String,
        /// Perception bundle JSON (symbols / lines / texts)
        #[arg(short, long)]
        input: PathBuf,
        /// Input holds raw detector, line and OCR output instead of a bundle
        #[arg(long)]
        raw: bool,
        /// Threshold overrides (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output analysis JSON (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate a stored graph and report issues.
    ///
    /// Exits non-zero when error-severity issues are found unless `--no-fail`.
    Validate {
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        #[arg(long)]
        no_fail: bool,
    },

    /// Export a stored graph.
    Export {
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(long, value_enum)]
        format: ExportFormat,
        /// Output file (dexpi) or directory receiving nodes.csv / edges.csv (csv)
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Ask a natural-language question about a stored graph.
    Query {
        #[arg(short, long)]
        graph: PathBuf,
        /// Knowledge base JSON
        #[arg(long)]
        kb: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        question: String,
    },

    /// Parse an instrument tag and print it as JSON.
    Tag { text: String },

    /// Analyze every `*.perception.json` / `*.raw.json` under a directory.
    Batch {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            diagram_id,
            input,
            raw,
            config,
            out,
        } => cmd_analyze(&diagram_id, &input, raw, config.as_deref(), out.as_deref()),
        Commands::Validate {
            graph,
            config,
            format,
            no_fail,
        } => cmd_validate(&graph, config.as_deref(), format, no_fail),
        Commands::Export { graph, format, out } => cmd_export(&graph, format, &out),
        Commands::Query {
            graph,
            kb,
            format,
            question,
        } => cmd_query(&graph, kb.as_deref(), format, &question),
        Commands::Tag { text } => io::write_json(&parse_tag(&text), None),
        Commands::Batch {
            input_dir,
            out_dir,
            config,
        } => {
            let config = io::load_config(config.as_deref())?;
            let pipeline = Pipeline::new(config.pipeline);
            batch::cmd_batch(&input_dir, &out_dir, &pipeline, &config.perception)
        }
    }
}

fn cmd_analyze(
    id: &str,
    input: &Path,
    raw: bool,
    config: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let id = DiagramId::new(id)?;
    let config = io::load_config(config)?;
    let bundle = io::load_bundle(input, raw, &config.perception)?;
    let analysis = Pipeline::new(config.pipeline).run(&id, bundle)?;

    io::write_json(&analysis, out)?;
    eprint!("{}", report::render_summary(id.as_str(), &analysis.summary));
    if let Some(path) = out {
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    Ok(())
}

fn cmd_validate(
    graph_path: &Path,
    config: Option<&Path>,
    format: ReportFormat,
    no_fail: bool,
) -> Result<()> {
    let mut graph = io::load_graph(graph_path)?;
    check_graph(&graph).with_context(|| format!("graph {}", graph_path.display()))?;
    let config = io::load_config(config)?;

    let issues = Validator::new(config.pipeline.validation).validate(&mut graph);
    match format {
        ReportFormat::Json => io::write_json(&issues, None)?,
        ReportFormat::Text => print!("{}", report::render_issues_text(&issues)),
    }

    let counts = IssueCounts::of(&issues);
    if counts.error > 0 && !no_fail {
        return Err(anyhow!("validation found {} error(s)", counts.error));
    }
    Ok(())
}

fn cmd_export(graph_path: &Path, format: ExportFormat, out: &Path) -> Result<()> {
    let graph = io::load_graph(graph_path)?;
    match format {
        ExportFormat::Dexpi => {
            fs::write(out, to_interchange_json(&graph)?)
                .with_context(|| format!("writing {}", out.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
        }
        ExportFormat::Csv => {
            let tables = to_tabular_export(&graph)?;
            fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
            for (name, body) in [("nodes.csv", &tables.nodes), ("edges.csv", &tables.edges)] {
                let path = out.join(name);
                fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
                eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
            }
        }
    }
    Ok(())
}

fn cmd_query(
    graph_path: &Path,
    kb: Option<&Path>,
    format: ReportFormat,
    question: &str,
) -> Result<()> {
    let graph = io::load_graph(graph_path)?;
    let kb = match kb {
        Some(path) => KnowledgeBase::from_json_file(path)?,
        None => {
            tracing::warn!("no knowledge base given; answers use the graph only");
            KnowledgeBase::default()
        }
    };
    let retriever =
        Retriever::with_embedder(kb, Box::new(TokenHashEmbedder), RetrievalConfig::default());
    let answer = QueryService::new(retriever).answer(question, &graph);

    match format {
        ReportFormat::Json => io::write_json(&answer, None)?,
        ReportFormat::Text => {
            println!("{}", answer.answer);
            if !answer.knowledge_sources.is_empty() {
                println!("\n{}", "sources".bold());
                for s in &answer.knowledge_sources {
                    let source = format!("{}:{}", s.kind, s.key);
                    println!("  {} {} ({:.2})", "→".yellow(), source.cyan(), s.similarity);
                }
            }
            println!("{} {:.2}", "confidence".bold(), answer.confidence);
        }
    }
    Ok(())
}
