//! Conceptgraph core: the concept graph model and its merge engine.
//!
//! ```text
//!  fragments ──► GraphAccumulator ──► normalize_identities ──► Graph
//!  (patches,       (union props,        (case/whitespace          │
//!   edges)          dedup edges)         collisions)              ▼
//!                                                        merge_nodes (operator)
//! ```
//!
//! Loading fragments from disk lives in `conceptgraph-ingest-json`; reading
//! and writing the graph document lives in `conceptgraph-storage`.

pub mod accumulate;
pub mod digest;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod report;
pub mod similarity;
pub mod suggest;

pub use accumulate::{Contribution, FragmentContent, GraphAccumulator, NodePatch};
pub use digest::graph_digest;
pub use merge::{merge_nodes, MergeOutcome, MergeRecord};
pub use model::{
    Edge, Graph, GraphMetadata, Node, NodeMetadata, PropertyValue, SubjectInfo,
    DEFAULT_NODE_TYPE, DEFAULT_RELATION_TYPE,
};
pub use normalize::{normalization_key, normalize_identities, NormalizationReport};
pub use report::{graph_stats, subject_index, validate_graph, GraphStats, ValidationReport};
pub use suggest::{incomplete_nodes, suggest_merge_targets, SuggestOptions, Suggestion};

/// Operator-facing failures of graph edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node '{name}' not found in graph")]
    NotFound { name: String },
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}
