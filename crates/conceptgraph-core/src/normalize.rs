//! Identity normalization: collapse nodes whose names differ only by case or
//! surrounding whitespace.
//!
//! Nodes are visited in mapping order; the first name seen for a given key is
//! canonical and every later collision is merged into it. No fuzzy matching
//! happens here (see [`crate::suggest`] for operator-facing suggestions).

use crate::merge::{absorb_node, MergeRecord};
use crate::model::Graph;
use std::collections::HashMap;

/// The identity key for a node name: trimmed and lowercased.
pub fn normalization_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Number of nodes merged away.
    pub collapsed: usize,
    /// One entry per collapse, in the order they happened.
    pub records: Vec<MergeRecord>,
}

pub fn normalize_identities(graph: &mut Graph) -> NormalizationReport {
    let names: Vec<String> = graph.nodes.keys().cloned().collect();
    let mut canonical: HashMap<String, String> = HashMap::with_capacity(names.len());
    let mut report = NormalizationReport::default();

    for name in names {
        let key = normalization_key(&name);
        let Some(existing) = canonical.get(&key) else {
            canonical.insert(key, name);
            continue;
        };
        if *existing == name {
            continue;
        }
        if let Some(absorbed) = absorb_node(graph, &name, existing) {
            tracing::debug!(
                duplicate = %name,
                canonical = %existing,
                edges_repointed = absorbed.edges_repointed,
                "collapsed duplicate node"
            );
            report.collapsed += 1;
            report.records.push(absorbed.record);
        }
    }

    if report.collapsed > 0 {
        graph.stamp_counts();
    }
    tracing::info!(collapsed = report.collapsed, "normalized duplicate nodes (case/spacing)");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node};

    #[test]
    fn key_trims_and_lowercases() {
        assert_eq!(normalization_key("  Binary SEARCH "), "binary search");
    }

    #[test]
    fn three_spellings_collapse_into_the_first() {
        let mut graph = Graph::new();
        graph
            .nodes
            .insert("Binary Search".to_string(), Node::default());
        graph.nodes.insert(
            " binary search ".to_string(),
            Node::default().with_domain("Algorithms"),
        );
        graph
            .nodes
            .insert("BINARY SEARCH".to_string(), Node::default().with_property("cost", "log n"));
        graph.nodes.insert("Array".to_string(), Node::default());
        graph.edges.push(Edge::new(" binary search ", "requires", "Array"));
        graph.edges.push(Edge::new("Array", "supports", "BINARY SEARCH"));
        graph.edges.push(Edge::new("Binary Search", "requires", "Array"));

        let report = normalize_identities(&mut graph);

        assert_eq!(report.collapsed, 2);
        assert_eq!(report.records.len(), 2);
        assert!(report
            .records
            .iter()
            .all(|r| r.new_name == "Binary Search"));
        assert_eq!(graph.node_count(), 2);

        let survivor = graph.node("Binary Search").unwrap();
        assert_eq!(survivor.domain, "Algorithms");
        assert!(survivor.properties.contains_key("cost"));

        assert_eq!(
            graph.edges,
            vec![
                Edge::new("Binary Search", "requires", "Array"),
                Edge::new("Array", "supports", "Binary Search"),
            ]
        );
    }

    #[test]
    fn distinct_names_are_untouched() {
        let mut graph = Graph::new();
        graph.nodes.insert("Stack".to_string(), Node::default());
        graph.nodes.insert("Queue".to_string(), Node::default());
        let before = graph.clone();
        let report = normalize_identities(&mut graph);
        assert_eq!(report.collapsed, 0);
        assert_eq!(graph, before);
    }
}
