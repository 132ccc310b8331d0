//! Conceptgraph CLI
//!
//! - `build`: fold `<input>/<subject>/*.json` fragments into one graph document
//! - `merge`: operator merges (single pair or an interactive session)
//! - `suggest` / `incomplete`: worklists for manual QA
//! - `index` / `validate` / `stats`: read-only reports over a built graph

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use conceptgraph_core::{
    graph_digest, graph_stats, incomplete_nodes, subject_index, suggest_merge_targets,
    validate_graph,
};
use conceptgraph_ingest_json::{build_graph, BuildOptions};
use conceptgraph_storage::{load_graph, save_graph, write_json_atomic, GraphConfig, MergeLog};
use std::io;
use std::path::PathBuf;

mod merge_session;

use merge_session::MergeSession;

#[derive(Parser)]
#[command(name = "conceptgraph")]
#[command(
    author,
    version,
    about = "Conceptgraph: merge JSON concept fragments into one knowledge graph"
)]
struct Cli {
    /// JSON config file (missing keys keep their defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct GraphArg {
    /// Graph document (defaults to `output_graph` from the config).
    #[arg(long)]
    graph: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the merged graph from the fragment tree.
    Build {
        /// Fragment root (`<root>/<subject>/*.json`).
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output graph document.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Merge audit log.
        #[arg(long)]
        merge_log: Option<PathBuf>,
        /// Skip case/whitespace identity normalization.
        #[arg(long)]
        no_normalize: bool,
    },

    /// Merge one node into another and persist the result.
    ///
    /// Without `--old`/`--new`, reads pairs from stdin until an empty line.
    Merge {
        #[command(flatten)]
        graph: GraphArg,
        #[arg(long)]
        merge_log: Option<PathBuf>,
        /// Node to merge away.
        #[arg(long, requires = "new")]
        old: Option<String>,
        /// Node that survives.
        #[arg(long, requires = "old")]
        new: Option<String>,
    },

    /// Rank existing node names by similarity to NAME.
    Suggest {
        name: String,
        #[command(flatten)]
        graph: GraphArg,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// List nodes with no domain, definition, description or properties.
    Incomplete {
        #[command(flatten)]
        graph: GraphArg,
        /// Also print merge suggestions for each incomplete node.
        #[arg(long)]
        suggest: bool,
    },

    /// Write the subject → node names index.
    Index {
        #[command(flatten)]
        graph: GraphArg,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check provenance and edge shape of a graph document.
    Validate {
        #[command(flatten)]
        graph: GraphArg,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summary counts for a graph document.
    Stats {
        #[command(flatten)]
        graph: GraphArg,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("conceptgraph=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = GraphConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            input,
            out,
            merge_log,
            no_normalize,
        } => {
            let input = input.unwrap_or_else(|| config.input_dir.clone());
            let out = out.unwrap_or_else(|| config.output_graph.clone());
            let merge_log = merge_log.unwrap_or_else(|| config.merge_log.clone());
            cmd_build(&config, input, &out, &merge_log, !no_normalize)?;
        }
        Commands::Merge {
            graph,
            merge_log,
            old,
            new,
        } => {
            let graph_path = resolve_graph(&config, &graph);
            let merge_log = merge_log.unwrap_or_else(|| config.merge_log.clone());
            cmd_merge(&config, &graph_path, &merge_log, old.zip(new))?;
        }
        Commands::Suggest {
            name,
            graph,
            limit,
            threshold,
        } => {
            let mut options = config.suggest_options();
            if let Some(limit) = limit {
                options.limit = limit;
            }
            if let Some(threshold) = threshold {
                options.threshold = threshold;
            }
            cmd_suggest(&resolve_graph(&config, &graph), &name, &options)?;
        }
        Commands::Incomplete { graph, suggest } => {
            cmd_incomplete(&config, &resolve_graph(&config, &graph), suggest)?;
        }
        Commands::Index { graph, out } => {
            let out = out.unwrap_or_else(|| config.subject_index.clone());
            cmd_index(&resolve_graph(&config, &graph), &out)?;
        }
        Commands::Validate { graph, json } => {
            cmd_validate(&resolve_graph(&config, &graph), json)?;
        }
        Commands::Stats { graph, json } => {
            cmd_stats(&resolve_graph(&config, &graph), json)?;
        }
    }

    Ok(())
}

fn resolve_graph(config: &GraphConfig, arg: &GraphArg) -> PathBuf {
    arg.graph
        .clone()
        .unwrap_or_else(|| config.output_graph.clone())
}

fn cmd_build(
    config: &GraphConfig,
    input: PathBuf,
    out: &PathBuf,
    merge_log: &PathBuf,
    normalize: bool,
) -> Result<()> {
    println!("{} {}", "Building graph from".green().bold(), input.display());

    let mut options = BuildOptions::new(input);
    options.skip_files = config.skip_files.clone();
    options.normalize = normalize;

    let mut built = build_graph(&options)?;
    save_graph(&mut built.graph, out)?;
    MergeLog::new(merge_log).append(&built.merges)?;

    let report = &built.report;
    println!("  Files: {} total", report.total_files);
    println!("    {} {}", "valid:".green(), report.valid_files);
    println!("    {} {}", "skipped:".yellow(), report.skipped_files);
    println!("  Subjects: {}", report.subjects);
    println!("  Nodes: {}", report.nodes);
    println!("  Edges: {}", report.edges);
    if report.collapsed > 0 {
        println!(
            "  Normalized: {} duplicate node(s) collapsed (logged to {})",
            report.collapsed,
            merge_log.display()
        );
    }
    println!("  Digest: {}", report.digest.cyan());
    println!("{} {} {}", "ok".green().bold(), "→".cyan(), out.display());
    Ok(())
}

fn cmd_merge(
    config: &GraphConfig,
    graph_path: &PathBuf,
    merge_log: &PathBuf,
    pair: Option<(String, String)>,
) -> Result<()> {
    let mut graph = load_graph(graph_path)?;
    let log = MergeLog::new(merge_log);
    println!(
        "{} {} ({} nodes, {} edges)",
        "Loaded".green().bold(),
        graph_path.display(),
        graph.node_count(),
        graph.edge_count()
    );

    let mut session = MergeSession {
        graph: &mut graph,
        graph_path,
        log: &log,
        suggest: config.suggest_options(),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match pair {
        Some((old, new)) => {
            if !session.apply(&old, &new, &mut out)? {
                return Err(anyhow!("merge of '{old}' into '{new}' was rejected"));
            }
        }
        None => {
            let stdin = io::stdin();
            session.run(&mut stdin.lock(), &mut out)?;
        }
    }
    Ok(())
}

fn cmd_suggest(
    graph_path: &PathBuf,
    name: &str,
    options: &conceptgraph_core::SuggestOptions,
) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let suggestions = suggest_merge_targets(&graph, name, options);
    if suggestions.is_empty() {
        println!(
            "{} no node within similarity {:.2} of '{}'",
            "none:".yellow(),
            options.threshold,
            name
        );
        return Ok(());
    }
    println!("{} '{}'", "Suggestions for".green().bold(), name);
    for s in suggestions {
        println!("  {:.2}  {}", s.score, s.name.cyan());
    }
    Ok(())
}

fn cmd_incomplete(config: &GraphConfig, graph_path: &PathBuf, with_suggestions: bool) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let names = incomplete_nodes(&graph);
    println!(
        "{} {} of {} nodes",
        "Incomplete:".yellow().bold(),
        names.len(),
        graph.node_count()
    );
    let options = config.suggest_options();
    for name in names {
        println!("  {}", name);
        if with_suggestions {
            for s in suggest_merge_targets(&graph, name, &options) {
                println!("    {} {} ({:.2})", "→".cyan(), s.name, s.score);
            }
        }
    }
    Ok(())
}

fn cmd_index(graph_path: &PathBuf, out: &PathBuf) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let index = subject_index(&graph);
    write_json_atomic(out, &index)?;
    println!(
        "{} {} subjects {} {}",
        "ok".green().bold(),
        index.len(),
        "→".cyan(),
        out.display()
    );
    Ok(())
}

fn cmd_validate(graph_path: &PathBuf, json: bool) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let report = validate_graph(&graph);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}", "Validating".green().bold(), graph_path.display());
        for finding in &report.findings {
            let level = if finding.level == "error" {
                finding.level.red().bold()
            } else {
                finding.level.yellow()
            };
            println!("  {} [{}] {}", level, finding.code, finding.message);
        }
        println!(
            "  {} error(s), {} warning(s)",
            report.error_count, report.warning_count
        );
    }

    if !report.is_valid() {
        return Err(anyhow!(
            "graph validation failed with {} error(s)",
            report.error_count
        ));
    }
    if !json {
        println!("{}", "Valid.".green());
    }
    Ok(())
}

fn cmd_stats(graph_path: &PathBuf, json: bool) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let stats = graph_stats(&graph);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} {}", "Graph".green().bold(), graph_path.display());
    println!("  Built at: {}", graph.metadata.built_at);
    if let Some(modified) = &graph.metadata.last_modified {
        println!("  Last modified: {}", modified);
    }
    println!("  Nodes: {}", stats.nodes);
    println!("  Edges: {}", stats.edges);
    println!("  Subjects: {}", stats.subjects);
    println!("  Incomplete nodes: {}", stats.incomplete_nodes);
    println!("  Ghost endpoints: {}", stats.ghost_endpoints);
    println!("  Relation types: {}", stats.relation_types.len());
    for (relation, count) in &stats.relation_types {
        println!("    {:<24} {}", relation.cyan(), count);
    }
    println!("  Digest: {}", graph_digest(&graph)?);
    Ok(())
}
