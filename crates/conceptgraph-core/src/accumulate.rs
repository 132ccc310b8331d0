//! Fold node patches and edges into a single graph.
//!
//! The accumulator owns the graph under construction. Each fold step takes the
//! graph so far plus one fragment's contribution; nothing is shared or global.
//!
//! Field semantics on collision (an entity contributed by several fragments):
//!
//! | field | policy |
//! |---|---|
//! | `properties` | union, later contribution wins per key |
//! | `domain` / `definition` / `description` | first non-empty value wins |
//! | `type` | first contribution wins |
//! | `metadata.subjects` / `metadata.source_files` | union |
//!
//! Edges are de-duplicated on the `(source, type, target)` triple.

use crate::model::{Edge, Graph, Node, SubjectInfo};
use chrono::{SecondsFormat, Utc};
use std::collections::HashSet;

/// A node contribution from one fragment, keyed by entity name.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePatch {
    pub name: String,
    pub node: Node,
}

impl NodePatch {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }
}

/// Everything one fragment contributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentContent {
    pub nodes: Vec<NodePatch>,
    pub edges: Vec<Edge>,
}

impl FragmentContent {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Where a contribution came from.
#[derive(Debug, Clone, Copy)]
pub struct Contribution<'a> {
    pub subject_id: &'a str,
    pub source_file: &'a str,
}

pub struct GraphAccumulator {
    graph: Graph,
    seen_edges: HashSet<Edge>,
}

impl Default for GraphAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphAccumulator {
    /// Start an empty graph stamped with the current UTC time.
    pub fn new() -> Self {
        let mut graph = Graph::new();
        graph.metadata.built_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        Self {
            graph,
            seen_edges: HashSet::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Record that `file_name` under `subject_id` was ingested.
    pub fn register_source(&mut self, subject_id: &str, display_name: &str, file_name: &str) {
        let entry = self
            .graph
            .metadata
            .subjects
            .entry(subject_id.to_string())
            .or_insert_with(|| SubjectInfo {
                subject_id: subject_id.to_string(),
                display_name: display_name.to_string(),
                files: Vec::new(),
            });
        entry.files.push(file_name.to_string());
    }

    /// Insert or merge one node patch.
    pub fn add_node(&mut self, patch: NodePatch, from: Contribution<'_>) {
        let NodePatch { name, node } = patch;
        match self.graph.nodes.get_mut(&name) {
            Some(existing) => {
                tracing::debug!(node = %name, file = from.source_file, "merging node contribution");
                existing.absorb(&node);
                existing.metadata.record(from.subject_id, from.source_file);
            }
            None => {
                let mut node = node;
                node.metadata.record(from.subject_id, from.source_file);
                self.graph.nodes.insert(name, node);
            }
        }
    }

    /// Append `edge` unless an identical triple is already present.
    /// Returns whether the edge was added.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.seen_edges.contains(&edge) {
            return false;
        }
        self.seen_edges.insert(edge.clone());
        self.graph.edges.push(edge);
        true
    }

    /// Fold one fragment: nodes first, then edges, in fragment order.
    pub fn add_fragment(&mut self, content: FragmentContent, from: Contribution<'_>) {
        let FragmentContent { nodes, edges } = content;
        for patch in nodes {
            self.add_node(patch, from);
        }
        let mut added = 0usize;
        let offered = edges.len();
        for edge in edges {
            if self.add_edge(edge) {
                added += 1;
            }
        }
        tracing::debug!(
            subject = from.subject_id,
            file = from.source_file,
            added,
            duplicates = offered - added,
            "folded fragment edges"
        );
    }

    /// Finish the build: provenance sets go into sorted order and the
    /// node/edge counts are stamped.
    pub fn finish(mut self) -> Graph {
        for node in self.graph.nodes.values_mut() {
            node.metadata.sort();
        }
        self.graph.stamp_counts();
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyValue;

    const FROM_A: Contribution<'static> = Contribution {
        subject_id: "algorithms",
        source_file: "a.json",
    };
    const FROM_B: Contribution<'static> = Contribution {
        subject_id: "data_structures",
        source_file: "b.json",
    };

    #[test]
    fn later_properties_win_and_union() {
        let mut acc = GraphAccumulator::new();
        acc.add_node(
            NodePatch::new("Merge Sort", Node::default().with_property("complexity", "O(n)")),
            FROM_A,
        );
        acc.add_node(
            NodePatch::new(
                "Merge Sort",
                Node::default()
                    .with_property("complexity", "O(n log n)")
                    .with_property("stable", "yes"),
            ),
            FROM_B,
        );
        let graph = acc.finish();
        let node = graph.node("Merge Sort").unwrap();
        assert_eq!(node.properties.len(), 2);
        assert_eq!(node.properties["complexity"], PropertyValue::from("O(n log n)"));
        assert_eq!(node.properties["stable"], PropertyValue::from("yes"));
    }

    #[test]
    fn first_non_empty_domain_wins() {
        let mut acc = GraphAccumulator::new();
        acc.add_node(NodePatch::new("Heap", Node::default()), FROM_A);
        acc.add_node(
            NodePatch::new("Heap", Node::default().with_domain("Data Structures")),
            FROM_B,
        );
        acc.add_node(
            NodePatch::new("Heap", Node::default().with_domain("Memory Management")),
            FROM_A,
        );
        let graph = acc.finish();
        assert_eq!(graph.node("Heap").unwrap().domain, "Data Structures");
    }

    #[test]
    fn provenance_is_unioned_and_sorted() {
        let mut acc = GraphAccumulator::new();
        acc.add_node(NodePatch::new("Heap", Node::default()), FROM_B);
        acc.add_node(NodePatch::new("Heap", Node::default()), FROM_A);
        acc.add_node(NodePatch::new("Heap", Node::default()), FROM_A);
        let graph = acc.finish();
        let meta = &graph.node("Heap").unwrap().metadata;
        let subjects: Vec<&str> = meta.subjects.iter().map(String::as_str).collect();
        let files: Vec<&str> = meta.source_files.iter().map(String::as_str).collect();
        assert_eq!(subjects, vec!["algorithms", "data_structures"]);
        assert_eq!(files, vec!["a.json", "b.json"]);
    }

    #[test]
    fn duplicate_edges_are_suppressed_but_types_differ() {
        let mut acc = GraphAccumulator::new();
        assert!(acc.add_edge(Edge::new("A", "uses", "B")));
        assert!(!acc.add_edge(Edge::new("A", "uses", "B")));
        assert!(acc.add_edge(Edge::new("A", "extends", "B")));
        let graph = acc.finish();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.metadata.edge_count, 2);
    }

    #[test]
    fn register_source_appends_files_per_subject() {
        let mut acc = GraphAccumulator::new();
        acc.register_source("graph_theory", "Graph Theory", "bfs.json");
        acc.register_source("graph_theory", "Graph Theory", "dfs.json");
        let graph = acc.finish();
        let info = &graph.metadata.subjects["graph_theory"];
        assert_eq!(info.display_name, "Graph Theory");
        assert_eq!(info.files, vec!["bfs.json", "dfs.json"]);
        assert!(!graph.metadata.built_at.is_empty());
    }
}
