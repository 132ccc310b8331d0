//! Full rebuild: discover → load → classify → fold → normalize.
//!
//! Per-file problems (empty, malformed, unreadable, unsupported shape) are
//! logged and counted, never fatal. The only hard failure is an input root
//! that cannot be listed.

use crate::fragment::{classify, Fragment};
use crate::loader::{iter_subject_files, load_fragment, LoadOutcome, SubjectFile, DEFAULT_SKIP_FILES};
use anyhow::{Context, Result};
use conceptgraph_core::{
    graph_digest, normalize_identities, Contribution, Graph, GraphAccumulator, MergeRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub input_dir: PathBuf,
    /// File names (compared case-insensitively) that are never ingested.
    pub skip_files: Vec<String>,
    /// Collapse case/whitespace duplicates after folding.
    pub normalize: bool,
}

impl BuildOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            skip_files: DEFAULT_SKIP_FILES.iter().map(|s| s.to_string()).collect(),
            normalize: true,
        }
    }
}

/// End-of-run summary. Always produced, so partial failures are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub total_files: usize,
    pub valid_files: usize,
    pub skipped_files: usize,
    pub nodes: usize,
    pub edges: usize,
    pub subjects: usize,
    /// Nodes merged away by identity normalization.
    pub collapsed: usize,
    /// Digest of nodes + edges (see `conceptgraph_core::digest`).
    pub digest: String,
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: Graph,
    pub report: BuildReport,
    /// Audit records for normalization merges, in the order they happened.
    pub merges: Vec<MergeRecord>,
}

/// Fold one parsed payload. Returns `false` if its shape is unsupported.
pub fn fold_payload(acc: &mut GraphAccumulator, file: &SubjectFile, payload: Value) -> bool {
    let file_name = file.file_name();
    let fragment = classify(payload);
    if let Fragment::Unsupported { reason } = &fragment {
        tracing::warn!(path = %file.path.display(), "unsupported schema skipped: {reason}");
        return false;
    }
    tracing::debug!(path = %file.path.display(), shape = fragment.shape_name(), "folding fragment");

    let adapted = fragment.adapt();
    for msg in &adapted.dropped {
        tracing::warn!(path = %file.path.display(), "dropped fragment element: {msg}");
    }

    acc.register_source(&file.subject_id, &file.display_name, &file_name);
    acc.add_fragment(
        adapted.content,
        Contribution {
            subject_id: &file.subject_id,
            source_file: &file_name,
        },
    );
    true
}

pub fn build_graph(options: &BuildOptions) -> Result<BuildOutput> {
    tracing::info!(root = %options.input_dir.display(), "scanning subject folders");
    let files = iter_subject_files(&options.input_dir, &options.skip_files)?;

    let mut acc = GraphAccumulator::new();
    let mut report = BuildReport::default();

    for file in files {
        report.total_files += 1;
        tracing::info!(subject = %file.display_name, file = %file.file_name(), "ingesting");

        let payload = match load_fragment(&file.path) {
            LoadOutcome::Parsed(payload) => payload,
            LoadOutcome::Empty => {
                tracing::warn!(path = %file.path.display(), "skipping empty file");
                report.skipped_files += 1;
                continue;
            }
            LoadOutcome::Malformed(err) => {
                tracing::warn!(path = %file.path.display(), "invalid JSON skipped: {err}");
                report.skipped_files += 1;
                continue;
            }
            LoadOutcome::Unreadable(err) => {
                tracing::warn!(path = %file.path.display(), "failed reading file: {err}");
                report.skipped_files += 1;
                continue;
            }
        };

        if fold_payload(&mut acc, &file, payload) {
            report.valid_files += 1;
        } else {
            report.skipped_files += 1;
        }
    }

    let mut graph = acc.finish();
    let mut merges = Vec::new();
    if options.normalize {
        let normalized = normalize_identities(&mut graph);
        report.collapsed = normalized.collapsed;
        merges = normalized.records;
    }
    graph.stamp_counts();

    report.nodes = graph.node_count();
    report.edges = graph.edge_count();
    report.subjects = graph.metadata.subjects.len();
    report.digest = graph_digest(&graph).context("failed computing graph digest")?;

    tracing::info!(
        total = report.total_files,
        valid = report.valid_files,
        skipped = report.skipped_files,
        nodes = report.nodes,
        edges = report.edges,
        "merge complete"
    );

    Ok(BuildOutput {
        graph,
        report,
        merges,
    })
}
