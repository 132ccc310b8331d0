//! Graph data model: nodes keyed by name, typed directed edges, build metadata.
//!
//! The serialized form of these types *is* the persisted graph document:
//!
//! ```text
//! {
//!   "nodes":    { "<name>": { type, domain, definition, description,
//!                             properties, metadata: { subjects, source_files } } },
//!   "edges":    [ { source, target, type } ],
//!   "metadata": { built_at, node_count, edge_count, subjects: { ... } }
//! }
//! ```
//!
//! Node order and edge order are insertion order. Neither is semantically
//! significant, but both are preserved so repeated builds serialize
//! identically.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_NODE_TYPE: &str = "Concept";
pub const DEFAULT_RELATION_TYPE: &str = "related_to";

fn default_node_type() -> String {
    DEFAULT_NODE_TYPE.to_string()
}

fn default_relation_type() -> String {
    DEFAULT_RELATION_TYPE.to_string()
}

/// Fragments frequently carry explicit `null`s; treat them like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_node_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_node_type))
}

fn null_as_relation_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_relation_type))
}

fn serialize_sorted<S>(set: &IndexSet<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<&String> = set.iter().collect();
    sorted.sort();
    sorted.serialize(serializer)
}

// ============================================================================
// Node
// ============================================================================

/// A property value. Fragments use strings or string lists; anything else is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
    Other(serde_json::Value),
}

impl PropertyValue {
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Text(s) => s.is_empty(),
            PropertyValue::List(items) => items.is_empty(),
            PropertyValue::Other(v) => v.is_null(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

/// Provenance of a node: which subjects and files contributed to it.
///
/// Held as insertion-ordered sets while building; always serialized sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        serialize_with = "serialize_sorted"
    )]
    pub subjects: IndexSet<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        serialize_with = "serialize_sorted"
    )]
    pub source_files: IndexSet<String>,
}

impl NodeMetadata {
    pub fn record(&mut self, subject_id: &str, source_file: &str) {
        self.subjects.insert(subject_id.to_string());
        self.source_files.insert(source_file.to_string());
    }

    pub fn union(&mut self, other: &NodeMetadata) {
        self.subjects.extend(other.subjects.iter().cloned());
        self.source_files.extend(other.source_files.iter().cloned());
    }

    /// Put both sets into sorted order (the persisted order).
    pub fn sort(&mut self) {
        self.subjects.sort();
        self.source_files.sort();
    }
}

/// One concept in the graph. The node's name is its key in [`Graph::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(
        rename = "type",
        default = "default_node_type",
        deserialize_with = "null_as_node_type"
    )]
    pub node_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub definition: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: IndexMap<String, PropertyValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: NodeMetadata,
    /// Any other keys a graph fragment carried, passed through unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            node_type: default_node_type(),
            domain: String::new(),
            definition: String::new(),
            description: String::new(),
            properties: IndexMap::new(),
            metadata: NodeMetadata::default(),
            extra: IndexMap::new(),
        }
    }
}

impl Node {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// A node with no domain, definition, description, or properties.
    pub fn is_incomplete(&self) -> bool {
        self.domain.trim().is_empty()
            && self.definition.trim().is_empty()
            && self.description.trim().is_empty()
            && self.properties.is_empty()
    }

    /// Fold another record of the same entity into this one.
    ///
    /// - `properties`: union; the incoming value wins on key collision.
    /// - `domain` / `definition` / `description`: only filled when empty here.
    /// - `metadata`: subject and source-file sets are unioned.
    /// - `type` is never changed.
    /// - pass-through keys follow the `properties` rule.
    pub fn absorb(&mut self, incoming: &Node) {
        for (key, value) in &incoming.properties {
            self.properties.insert(key.clone(), value.clone());
        }
        for (key, value) in &incoming.extra {
            self.extra.insert(key.clone(), value.clone());
        }
        fill_if_empty(&mut self.domain, &incoming.domain);
        fill_if_empty(&mut self.definition, &incoming.definition);
        fill_if_empty(&mut self.description, &incoming.description);
        self.metadata.union(&incoming.metadata);
    }
}

fn fill_if_empty(slot: &mut String, incoming: &str) {
    if slot.is_empty() && !incoming.is_empty() {
        *slot = incoming.to_string();
    }
}

// ============================================================================
// Edge
// ============================================================================

/// A directed, typed relation. Identity is the `(source, type, target)` triple.
///
/// Endpoints are names and are not required to exist in [`Graph::nodes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(
        rename = "type",
        default = "default_relation_type",
        deserialize_with = "null_as_relation_type"
    )]
    pub relation: String,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }

    pub fn touches(&self, name: &str) -> bool {
        self.source == name || self.target == name
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Provenance entry for one subject folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub subject_id: String,
    pub display_name: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// ISO-8601 build timestamp.
    #[serde(default)]
    pub built_at: String,
    #[serde(default)]
    pub node_count: usize,
    #[serde(default)]
    pub edge_count: usize,
    /// Set when the graph is edited after the build (manual merge).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub subjects: BTreeMap<String, SubjectInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: IndexMap<String, Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub metadata: GraphMetadata,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.iter().any(|e| e == edge)
    }

    pub fn edges_touching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(name))
    }

    /// Copy the current node/edge counts into the build metadata.
    pub fn stamp_counts(&mut self) {
        self.metadata.node_count = self.nodes.len();
        self.metadata.edge_count = self.edges.len();
    }

    /// Rewrite every endpoint equal to `from` as `to`. Returns the number of
    /// edges touched.
    pub(crate) fn repoint_edges(&mut self, from: &str, to: &str) -> usize {
        let mut touched = 0;
        for edge in &mut self.edges {
            let mut hit = false;
            if edge.source == from {
                edge.source = to.to_string();
                hit = true;
            }
            if edge.target == from {
                edge.target = to.to_string();
                hit = true;
            }
            if hit {
                touched += 1;
            }
        }
        touched
    }

    /// Drop later copies of any repeated `(source, type, target)` triple,
    /// keeping the first. Returns the number removed.
    pub(crate) fn dedup_edges(&mut self) -> usize {
        let before = self.edges.len();
        let mut seen = std::collections::HashSet::with_capacity(before);
        self.edges.retain(|edge| seen.insert(edge.clone()));
        before - self.edges.len()
    }
}
