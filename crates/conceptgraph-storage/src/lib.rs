//! Conceptgraph storage
//!
//! Everything that touches disk after ingestion:
//!
//! ```text
//!  build / merge ──► save_graph ──► merged_graph.json   (atomic replace)
//!        │
//!        └────────► MergeLog   ──► merge_log.txt       (append only)
//! ```
//!
//! The audit log is appended only after the graph write succeeded, so a log
//! entry always describes a persisted merge.

pub mod config;
pub mod document;
pub mod merge_log;

pub use config::GraphConfig;
pub use document::{load_graph, save_graph, write_json_atomic};
pub use merge_log::{format_entry, parse_entry, MergeLog};

use anyhow::Result;
use conceptgraph_core::{merge_nodes, Graph, MergeOutcome};
use std::path::Path;

/// Apply a manual merge and persist it: graph first, then the audit entry.
///
/// On any merge error the graph on disk and the log are left untouched.
pub fn merge_and_persist(
    graph: &mut Graph,
    old_name: &str,
    new_name: &str,
    graph_path: &Path,
    log: &MergeLog,
) -> Result<MergeOutcome> {
    let outcome = merge_nodes(graph, old_name, new_name)?;
    save_graph(graph, graph_path)?;
    log.append(std::slice::from_ref(&outcome.record))?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptgraph_core::{Edge, GraphError, Node};
    use tempfile::tempdir;

    fn graph() -> Graph {
        let mut graph = Graph::new();
        graph.nodes.insert("FFT".to_string(), Node::default());
        graph
            .nodes
            .insert("Fast Fourier Transform".to_string(), Node::default());
        graph.edges.push(Edge::new("FFT", "used_in", "Signal Processing"));
        graph
    }

    #[test]
    fn merge_persists_graph_then_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged_graph.json");
        let log = MergeLog::new(dir.path().join("merge_log.txt"));
        let mut g = graph();

        merge_and_persist(&mut g, "FFT", "Fast Fourier Transform", &path, &log).unwrap();

        let saved = load_graph(&path).unwrap();
        assert!(!saved.contains_node("FFT"));
        assert_eq!(saved.edges[0].source, "Fast Fourier Transform");
        assert!(saved.metadata.last_modified.is_some());
        assert_eq!(log.read_entries().unwrap().len(), 1);
    }

    #[test]
    fn failed_merge_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged_graph.json");
        let log = MergeLog::new(dir.path().join("merge_log.txt"));
        let mut g = graph();

        let err = merge_and_persist(&mut g, "DFT", "Fast Fourier Transform", &path, &log)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::NotFound { .. })
        ));
        assert!(!path.exists());
        assert!(!log.path().exists());
    }
}
