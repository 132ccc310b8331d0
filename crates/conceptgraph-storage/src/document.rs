//! The graph document on disk.
//!
//! Writes are atomic: the document is written to a temporary file in the
//! destination directory, synced, then renamed over the target. An
//! interrupted write leaves the previous document untouched.

use anyhow::{Context, Result};
use conceptgraph_core::Graph;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory `{}`", dir.display()))?;

    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in `{}`", dir.display()))?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write `{}`", path.display()))?;
    Ok(())
}

/// Stamp node/edge counts into the metadata and write the document.
pub fn save_graph(graph: &mut Graph, path: &Path) -> Result<()> {
    graph.stamp_counts();
    write_json_atomic(path, graph)?;
    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph saved"
    );
    Ok(())
}

pub fn load_graph(path: &Path) -> Result<Graph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("graph not found: `{}`", path.display()))?;
    let graph: Graph = serde_json::from_str(&text)
        .with_context(|| format!("graph document `{}` is corrupted or unreadable", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}
