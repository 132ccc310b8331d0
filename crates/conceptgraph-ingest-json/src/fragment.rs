//! Fragment shapes and their conversion into node patches and edges.
//!
//! A parsed payload is classified exactly once into one of:
//!
//! - **Graph**: an object with a `nodes` object and an `edges` array
//!   (e.g. an earlier merged graph, or a hand-written topic graph),
//! - **Entity**: an object with an `entity` key,
//! - **EntityList**: an array; items that are objects with an `entity` key
//!   are kept, all other items are dropped,
//! - **Unsupported**: anything else.
//!
//! Classification is per payload, not per file extension. Node fields are
//! read one at a time: a field of the wrong JSON type falls back to its
//! default and is reported, the rest of the node is kept.

use conceptgraph_core::{
    Edge, FragmentContent, Node, NodeMetadata, NodePatch, PropertyValue, DEFAULT_NODE_TYPE,
    DEFAULT_RELATION_TYPE,
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Graph(GraphFragment),
    Entity(EntityFragment),
    EntityList {
        entities: Vec<EntityFragment>,
        /// One message per item that was not a usable entity object.
        dropped: Vec<String>,
    },
    Unsupported {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphFragment {
    pub nodes: Map<String, Value>,
    pub edges: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityFragment {
    pub entity: String,
    pub node: Node,
    pub relations: Vec<Value>,
    /// Fields that were ignored because of their JSON type.
    pub issues: Vec<String>,
}

/// Node patches and edges from one fragment, plus a message per element that
/// had to be dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adapted {
    pub content: FragmentContent,
    pub dropped: Vec<String>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text_field(
    obj: &mut Map<String, Value>,
    key: &str,
    owner: &str,
    issues: &mut Vec<String>,
) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(text)) => Some(text),
        Some(Value::Null) | None => None,
        Some(other) => {
            issues.push(format!(
                "`{key}` of '{owner}' is a {}, expected a string",
                json_kind(&other)
            ));
            None
        }
    }
}

/// Build a node from a fragment object, field by field.
///
/// Recognized keys are removed from `obj`; whatever is left is returned to
/// the caller.
fn node_from_fields(obj: &mut Map<String, Value>, owner: &str, issues: &mut Vec<String>) -> Node {
    let mut node = Node::new(
        text_field(obj, "type", owner, issues).unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
    );
    node.domain = text_field(obj, "domain", owner, issues).unwrap_or_default();
    node.definition = text_field(obj, "definition", owner, issues).unwrap_or_default();
    node.description = text_field(obj, "description", owner, issues).unwrap_or_default();

    match obj.remove("properties") {
        Some(Value::Object(props)) => {
            for (key, value) in props {
                match serde_json::from_value::<PropertyValue>(value) {
                    Ok(value) => {
                        node.properties.insert(key, value);
                    }
                    Err(e) => issues.push(format!("property `{key}` of '{owner}': {e}")),
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => issues.push(format!(
            "`properties` of '{owner}' is a {}, expected an object",
            json_kind(&other)
        )),
    }
    node
}

/// A graph-shaped node value. Provenance and unrecognized keys are kept.
fn graph_node(name: &str, value: Value, issues: &mut Vec<String>) -> Option<Node> {
    let Value::Object(mut obj) = value else {
        issues.push(format!("node '{name}' is a {}, expected an object", json_kind(&value)));
        return None;
    };
    let mut node = node_from_fields(&mut obj, name, issues);
    match obj.remove("metadata") {
        Some(Value::Null) | None => {}
        Some(value) => match serde_json::from_value::<NodeMetadata>(value) {
            Ok(metadata) => node.metadata = metadata,
            Err(e) => issues.push(format!("metadata of '{name}' ignored: {e}")),
        },
    }
    node.extra.extend(obj);
    Some(node)
}

impl EntityFragment {
    /// Build from an object known to contain an `entity` key.
    ///
    /// Fails only when the entity name itself is unusable.
    pub fn from_object(mut obj: Map<String, Value>) -> Result<Self, String> {
        let entity = match obj.remove("entity") {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(format!("`entity` must be a string, found {}", json_kind(&other)))
            }
            None => return Err("missing `entity` key".to_string()),
        };
        let mut issues = Vec::new();
        let relations = match obj.remove("relations") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                issues.push(format!(
                    "`relations` of '{entity}' is a {}, expected an array",
                    json_kind(&other)
                ));
                Vec::new()
            }
        };
        // Only the known fields are taken; provenance is recorded on fold.
        let node = node_from_fields(&mut obj, &entity, &mut issues);

        Ok(Self {
            entity,
            node,
            relations,
            issues,
        })
    }

    fn adapt_into(self, out: &mut Adapted) {
        let EntityFragment {
            entity,
            node,
            relations,
            issues,
        } = self;
        out.dropped.extend(issues);
        for relation in relations {
            match relation_edge(&entity, relation) {
                Ok(edge) => out.content.edges.push(edge),
                Err(msg) => out.dropped.push(msg),
            }
        }
        out.content.nodes.push(NodePatch::new(entity, node));
    }
}

/// `{"target": ..., "type": ...}` on entity `source` -> edge.
fn relation_edge(source: &str, relation: Value) -> Result<Edge, String> {
    let Value::Object(rel) = relation else {
        return Err(format!(
            "relation of '{source}' is a {}, expected an object",
            json_kind(&relation)
        ));
    };
    let target = match rel.get("target") {
        Some(Value::String(target)) => target.clone(),
        Some(other) => {
            return Err(format!(
                "relation of '{source}' has a {} target",
                json_kind(other)
            ))
        }
        None => return Err(format!("relation of '{source}' has no target")),
    };
    let relation_type = match rel.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Null) | None => DEFAULT_RELATION_TYPE.to_string(),
        Some(other) => {
            return Err(format!(
                "relation '{source}' -> '{target}' has a {} type",
                json_kind(other)
            ))
        }
    };
    Ok(Edge::new(source, relation_type, target))
}

/// Classify a parsed payload into exactly one shape.
pub fn classify(payload: Value) -> Fragment {
    match payload {
        Value::Object(mut obj) => {
            let is_graph = matches!(obj.get("nodes"), Some(Value::Object(_)))
                && matches!(obj.get("edges"), Some(Value::Array(_)));
            if is_graph {
                let nodes = match obj.remove("nodes") {
                    Some(Value::Object(nodes)) => nodes,
                    _ => Map::new(),
                };
                let edges = match obj.remove("edges") {
                    Some(Value::Array(edges)) => edges,
                    _ => Vec::new(),
                };
                return Fragment::Graph(GraphFragment { nodes, edges });
            }
            if obj.contains_key("entity") {
                return match EntityFragment::from_object(obj) {
                    Ok(entity) => Fragment::Entity(entity),
                    Err(reason) => Fragment::Unsupported { reason },
                };
            }
            let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            keys.truncate(8);
            Fragment::Unsupported {
                reason: format!(
                    "object has neither `entity` nor `nodes`+`edges` (keys: {})",
                    keys.join(", ")
                ),
            }
        }
        Value::Array(items) => {
            let mut entities = Vec::new();
            let mut dropped = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(obj) if obj.contains_key("entity") => {
                        match EntityFragment::from_object(obj) {
                            Ok(entity) => entities.push(entity),
                            Err(reason) => dropped.push(format!("item #{i}: {reason}")),
                        }
                    }
                    other => dropped.push(format!(
                        "item #{i}: {} without an `entity` key",
                        json_kind(&other)
                    )),
                }
            }
            Fragment::EntityList { entities, dropped }
        }
        other => Fragment::Unsupported {
            reason: format!("top-level {} payload", json_kind(&other)),
        },
    }
}

impl Fragment {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Fragment::Unsupported { .. })
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Fragment::Graph(_) => "graph",
            Fragment::Entity(_) => "entity",
            Fragment::EntityList { .. } => "entity_list",
            Fragment::Unsupported { .. } => "unsupported",
        }
    }

    /// Convert into node patches and edges. Unsupported fragments yield nothing.
    pub fn adapt(self) -> Adapted {
        let mut out = Adapted::default();
        match self {
            Fragment::Graph(GraphFragment { nodes, edges }) => {
                for (name, value) in nodes {
                    if let Some(node) = graph_node(&name, value, &mut out.dropped) {
                        out.content.nodes.push(NodePatch::new(name, node));
                    }
                }
                for (i, value) in edges.into_iter().enumerate() {
                    match serde_json::from_value::<Edge>(value) {
                        Ok(edge) => out.content.edges.push(edge),
                        Err(e) => out.dropped.push(format!("edge #{i}: {e}")),
                    }
                }
            }
            Fragment::Entity(entity) => entity.adapt_into(&mut out),
            Fragment::EntityList { entities, dropped } => {
                out.dropped.extend(dropped);
                for entity in entities {
                    entity.adapt_into(&mut out);
                }
            }
            Fragment::Unsupported { .. } => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptgraph_core::PropertyValue;
    use serde_json::json;

    #[test]
    fn graph_shape_requires_nodes_object_and_edges_array() {
        let f = classify(json!({"nodes": {"A": {}}, "edges": []}));
        assert_eq!(f.shape_name(), "graph");

        let f = classify(json!({"nodes": [], "edges": []}));
        assert!(!f.is_supported());
    }

    #[test]
    fn graph_beats_entity_when_both_present() {
        let f = classify(json!({"entity": "X", "nodes": {}, "edges": []}));
        assert_eq!(f.shape_name(), "graph");
    }

    #[test]
    fn entity_shape_applies_defaults_and_relations() {
        let f = classify(json!({
            "entity": "FFT",
            "domain": "Signal Processing",
            "properties": {"complexity": "O(n log n)"},
            "relations": [
                {"target": "DFT", "type": "computes"},
                {"target": "Signal Processing"},
                {"type": "orphan"}
            ]
        }));
        let adapted = f.adapt();
        let patch = &adapted.content.nodes[0];
        assert_eq!(patch.name, "FFT");
        assert_eq!(patch.node.node_type, "Concept");
        assert_eq!(patch.node.domain, "Signal Processing");
        assert_eq!(patch.node.definition, "");
        assert_eq!(
            patch.node.properties["complexity"],
            PropertyValue::from("O(n log n)")
        );
        assert_eq!(
            adapted.content.edges,
            vec![
                Edge::new("FFT", "computes", "DFT"),
                Edge::new("FFT", "related_to", "Signal Processing"),
            ]
        );
        assert_eq!(adapted.dropped.len(), 1);
    }

    #[test]
    fn entity_metadata_in_payload_is_ignored() {
        let f = classify(json!({"entity": "Heap", "metadata": {"subjects": ["bogus"]}}));
        let adapted = f.adapt();
        assert!(adapted.content.nodes[0].node.metadata.subjects.is_empty());
    }

    #[test]
    fn list_shape_drops_non_entities() {
        let f = classify(json!([
            {"entity": "Stack"},
            {"name": "not an entity"},
            42,
            {"entity": "Queue", "type": "ADT"}
        ]));
        match &f {
            Fragment::EntityList { entities, dropped } => {
                assert_eq!(entities.len(), 2);
                assert_eq!(dropped.len(), 2);
            }
            other => panic!("expected entity list, got {other:?}"),
        }
        let adapted = f.adapt();
        let names: Vec<&str> = adapted.content.nodes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Stack", "Queue"]);
        assert_eq!(adapted.content.nodes[1].node.node_type, "ADT");
    }

    #[test]
    fn scalars_and_plain_objects_are_unsupported() {
        assert!(!classify(json!("hello")).is_supported());
        assert!(!classify(json!(3)).is_supported());
        assert!(!classify(json!({"title": "Notes"})).is_supported());
        assert!(!classify(json!({"entity": 7})).is_supported());
        assert!(classify(json!({"title": "Notes"})).adapt().content.is_empty());
    }

    #[test]
    fn graph_shape_keeps_node_metadata_and_drops_bad_edges() {
        let f = classify(json!({
            "nodes": {
                "Heap": {"type": "DataStructure", "metadata": {"subjects": ["ds"], "source_files": ["old.json"]}},
                "Broken": "not an object"
            },
            "edges": [
                {"source": "Heap", "target": "Array", "type": "built_on"},
                {"source": "Heap"}
            ]
        }));
        let adapted = f.adapt();
        assert_eq!(adapted.content.nodes.len(), 1);
        assert!(adapted.content.nodes[0].node.metadata.subjects.contains("ds"));
        assert_eq!(adapted.content.edges, vec![Edge::new("Heap", "built_on", "Array")]);
        assert_eq!(adapted.dropped.len(), 2);
    }

    #[test]
    fn mistyped_entity_field_falls_back_to_default() {
        let f = classify(json!({
            "entity": "Heap",
            "domain": ["Data Structures"],
            "definition": "A tree-shaped priority queue",
            "relations": [{"target": "Array", "type": "uses"}]
        }));
        assert_eq!(f.shape_name(), "entity");

        let adapted = f.adapt();
        let patch = &adapted.content.nodes[0];
        assert_eq!(patch.name, "Heap");
        assert_eq!(patch.node.domain, "");
        assert_eq!(patch.node.definition, "A tree-shaped priority queue");
        assert_eq!(adapted.content.edges, vec![Edge::new("Heap", "uses", "Array")]);
        assert_eq!(adapted.dropped.len(), 1);
        assert!(adapted.dropped[0].contains("`domain` of 'Heap'"));
    }

    #[test]
    fn list_item_with_mistyped_properties_is_kept() {
        let adapted = classify(json!([
            {"entity": "Stack", "properties": ["lifo"], "type": 3},
            {"entity": "Queue"},
            {"entity": ["not", "a", "name"]}
        ]))
        .adapt();

        let names: Vec<&str> = adapted.content.nodes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Stack", "Queue"]);
        let stack = &adapted.content.nodes[0].node;
        assert!(stack.properties.is_empty());
        assert_eq!(stack.node_type, "Concept");
        // `properties`, `type`, and the unnamed item are all reported.
        assert_eq!(adapted.dropped.len(), 3);
        assert!(adapted.dropped.iter().any(|m| m.starts_with("item #2")));
    }

    #[test]
    fn graph_node_keeps_good_fields_and_unknown_keys() {
        let adapted = classify(json!({
            "nodes": {"Trie": {"definition": 7, "domain": "Strings", "aliases": ["prefix tree"],
                               "metadata": "bogus"}},
            "edges": []
        }))
        .adapt();

        let trie = &adapted.content.nodes[0].node;
        assert_eq!(adapted.content.nodes[0].name, "Trie");
        assert_eq!(trie.domain, "Strings");
        assert_eq!(trie.definition, "");
        assert_eq!(trie.extra["aliases"], json!(["prefix tree"]));
        assert!(trie.metadata.subjects.is_empty());
        assert_eq!(adapted.dropped.len(), 2);
    }
}
