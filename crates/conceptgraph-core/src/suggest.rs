//! Operator aids for manual cleanup: the incomplete-node worklist and
//! similarity-ranked merge-target suggestions.
//!
//! Suggestions are advisory only; nothing here mutates the graph.

use crate::model::Graph;
use crate::normalize::normalization_key;
use crate::similarity::similarity;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestOptions {
    pub limit: usize,
    /// Minimum similarity (inclusive) for a name to be suggested.
    pub threshold: f64,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SUGGESTION_LIMIT,
            threshold: DEFAULT_SUGGESTION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub name: String,
    pub score: f64,
}

/// Names of nodes with no domain, definition, description, or properties,
/// in node order.
pub fn incomplete_nodes(graph: &Graph) -> Vec<&str> {
    graph
        .nodes
        .iter()
        .filter(|(_, node)| node.is_incomplete())
        .map(|(name, _)| name.as_str())
        .collect()
}

/// Rank existing node names by similarity to `candidate`.
///
/// The candidate itself is never suggested. Ties are broken by name so the
/// output is stable.
pub fn suggest_merge_targets(
    graph: &Graph,
    candidate: &str,
    options: &SuggestOptions,
) -> Vec<Suggestion> {
    let needle = normalization_key(candidate);
    let mut ranked: Vec<Suggestion> = graph
        .nodes
        .keys()
        .filter(|name| name.as_str() != candidate)
        .filter_map(|name| {
            let score = similarity(&needle, &normalization_key(name));
            (score >= options.threshold).then(|| Suggestion {
                name: name.clone(),
                score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(options.limit);
    ranked
}
