//! Content digests for built graphs.
//!
//! A build is reproducible when two runs over unchanged input produce the same
//! nodes and edges; the build timestamp is expected to differ. The digest
//! covers exactly that content so two builds can be compared by a short id.
//!
//! - algorithm: FNV-1a 64-bit
//! - input: compact JSON of `[nodes, edges]` (node metadata serialized sorted)
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! Not a security primitive.

use crate::model::Graph;

const PREFIX: &str = "fnv1a64:";

fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Digest of a graph's nodes and edges, ignoring build metadata.
pub fn graph_digest(graph: &Graph) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(&(&graph.nodes, &graph.edges))?;
    Ok(format!("{PREFIX}{:016x}", fnv1a64(&bytes)))
}
