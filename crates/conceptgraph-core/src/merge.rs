//! Merge one node into another: the primitive shared by identity
//! normalization and operator-driven manual merges.
//!
//! Merging `old` into `new`:
//! 1. `new` absorbs `old` (see [`Node::absorb`]),
//! 2. every edge endpoint equal to `old` is rewritten to `new`,
//! 3. triples that became duplicates are dropped,
//! 4. `old` is removed from the node mapping,
//! 5. a [`MergeRecord`] is produced for the audit log.
//!
//! Validation happens before any mutation, so a failed merge leaves the graph
//! untouched and produces no record.

use crate::model::Graph;
use crate::GraphError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One audit-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub merged_at: DateTime<Utc>,
    pub old_name: String,
    pub new_name: String,
}

/// Result of a successful manual merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub record: MergeRecord,
    pub edges_repointed: usize,
    pub duplicate_edges_removed: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

pub(crate) struct Absorbed {
    pub record: MergeRecord,
    pub edges_repointed: usize,
    pub duplicate_edges_removed: usize,
}

/// Merge `old_name` into `new_name` without validating the pair. Returns
/// `None` when either node is missing.
pub(crate) fn absorb_node(graph: &mut Graph, old_name: &str, new_name: &str) -> Option<Absorbed> {
    if old_name == new_name || !graph.contains_node(new_name) {
        return None;
    }
    let old = graph.nodes.shift_remove(old_name)?;
    let target = graph.nodes.get_mut(new_name)?;
    target.absorb(&old);

    let edges_repointed = graph.repoint_edges(old_name, new_name);
    let duplicate_edges_removed = if edges_repointed > 0 {
        graph.dedup_edges()
    } else {
        0
    };

    Some(Absorbed {
        record: MergeRecord {
            merged_at: Utc::now(),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        },
        edges_repointed,
        duplicate_edges_removed,
    })
}

/// Merge the node `old_name` into `new_name`.
///
/// Fails with [`GraphError::NotFound`] if either name is not a node, and with
/// [`GraphError::InvalidOperation`] if the two names are equal.
pub fn merge_nodes(
    graph: &mut Graph,
    old_name: &str,
    new_name: &str,
) -> Result<MergeOutcome, GraphError> {
    for name in [old_name, new_name] {
        if !graph.contains_node(name) {
            return Err(GraphError::NotFound {
                name: name.to_string(),
            });
        }
    }
    if old_name == new_name {
        return Err(GraphError::InvalidOperation(format!(
            "cannot merge '{old_name}' into itself"
        )));
    }

    let absorbed = absorb_node(graph, old_name, new_name).ok_or_else(|| GraphError::NotFound {
        name: old_name.to_string(),
    })?;
    graph.stamp_counts();
    graph.metadata.last_modified = Some(
        absorbed
            .record
            .merged_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    );

    tracing::info!(
        old = old_name,
        new = new_name,
        edges_repointed = absorbed.edges_repointed,
        "merged node"
    );

    Ok(MergeOutcome {
        record: absorbed.record,
        edges_repointed: absorbed.edges_repointed,
        duplicate_edges_removed: absorbed.duplicate_edges_removed,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
    })
}
