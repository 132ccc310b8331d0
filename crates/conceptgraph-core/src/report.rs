//! Read-only reports over a built graph: subject index, schema validation,
//! and summary statistics.

use crate::model::Graph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Subject id -> sorted names of the nodes that subject contributed to.
pub fn subject_index(graph: &Graph) -> BTreeMap<String, Vec<String>> {
    let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, node) in &graph.nodes {
        for subject in &node.metadata.subjects {
            index.entry(subject.clone()).or_default().push(name.clone());
        }
    }
    for names in index.values_mut() {
        names.sort();
    }
    index
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub level: String, // "error" | "warning"
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub error_count: usize,
    pub warning_count: usize,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.error_count == 0
    }

    fn error(&mut self, code: &str, message: String) {
        self.error_count += 1;
        self.findings.push(ValidationFinding {
            level: "error".to_string(),
            code: code.to_string(),
            message,
        });
    }

    fn warning(&mut self, code: &str, message: String) {
        self.warning_count += 1;
        self.findings.push(ValidationFinding {
            level: "warning".to_string(),
            code: code.to_string(),
            message,
        });
    }
}

/// Check the structural expectations downstream consumers rely on.
///
/// - every node has at least one contributing subject (`missing_provenance`)
/// - every edge has non-empty endpoints (`empty_endpoint`) and a relation
///   label (`empty_relation`)
/// - the stored counts match the content (`stale_counts`, warning)
///
/// Ghost endpoints are allowed and not reported here.
pub fn validate_graph(graph: &Graph) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (name, node) in &graph.nodes {
        if node.metadata.subjects.is_empty() {
            report.error(
                "missing_provenance",
                format!("node '{name}' has no contributing subject"),
            );
        }
    }

    for (i, edge) in graph.edges.iter().enumerate() {
        if edge.source.trim().is_empty() || edge.target.trim().is_empty() {
            report.error(
                "empty_endpoint",
                format!(
                    "edge #{i} ('{}' -[{}]-> '{}') has an empty endpoint",
                    edge.source, edge.relation, edge.target
                ),
            );
        }
        if edge.relation.trim().is_empty() {
            report.error(
                "empty_relation",
                format!("edge #{i} ('{}' -> '{}') has no relation type", edge.source, edge.target),
            );
        }
    }

    if graph.metadata.node_count != graph.node_count()
        || graph.metadata.edge_count != graph.edge_count()
    {
        report.warning(
            "stale_counts",
            format!(
                "metadata says {} nodes / {} edges, graph has {} / {}",
                graph.metadata.node_count,
                graph.metadata.edge_count,
                graph.node_count(),
                graph.edge_count()
            ),
        );
    }

    report
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub subjects: usize,
    pub incomplete_nodes: usize,
    /// Distinct edge endpoints with no node record.
    pub ghost_endpoints: usize,
    /// Edge count per relation type.
    pub relation_types: BTreeMap<String, usize>,
}

pub fn graph_stats(graph: &Graph) -> GraphStats {
    let mut relation_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut ghosts: BTreeSet<&str> = BTreeSet::new();
    for edge in &graph.edges {
        *relation_types.entry(edge.relation.clone()).or_default() += 1;
        for endpoint in [&edge.source, &edge.target] {
            if !graph.contains_node(endpoint) {
                ghosts.insert(endpoint.as_str());
            }
        }
    }

    GraphStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        subjects: graph.metadata.subjects.len(),
        incomplete_nodes: graph.nodes.values().filter(|n| n.is_incomplete()).count(),
        ghost_endpoints: ghosts.len(),
        relation_types,
    }
}
