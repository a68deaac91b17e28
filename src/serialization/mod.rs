//! JSON document export and import for the whole graph
//!
//! The document has two arrays:
//!
//! ```json
//! { "nodes": [ {"id": "...", "type": "product", "name": "...", ...} ],
//!   "edges": [ {"source": "...", "target": "...", "relationship": "...", ...} ] }
//! ```
//!
//! A node entry is flat: core attributes, the typed attributes of its kind,
//! and then its extra attributes. An edge entry is its endpoints and
//! relationship followed by its properties. Import accepts `node_type` as an
//! alias for `type`, and a node without a name takes the slug of its ID.

use crate::graph::{
    GapType, GraphStore, Node, NodeId, NodeKind, NodeType, PropertyMap, PropertyValue,
    Relationship, EDGE_CORE_ATTRIBUTES,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while reading or writing a graph document
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed graph document: {0}")]
    Malformed(String),
}

pub type SerializationResult<T> = Result<T, SerializationError>;

fn malformed(message: impl Into<String>) -> SerializationError {
    SerializationError::Malformed(message.into())
}

impl GraphStore {
    /// Export every node and edge as a JSON document
    pub fn export_to_json(&self) -> Value {
        let nodes: Vec<Value> = self.all_nodes().map(node_entry).collect();
        let edges: Vec<Value> = self
            .all_edges()
            .map(|edge| {
                let mut entry = Map::new();
                for (key, value) in &edge.properties {
                    entry.insert(key.clone(), value.to_json());
                }
                entry.insert("source".to_string(), Value::from(edge.source.as_str()));
                entry.insert("target".to_string(), Value::from(edge.target.as_str()));
                entry.insert(
                    "relationship".to_string(),
                    Value::from(edge.relationship.as_str()),
                );
                Value::Object(entry)
            })
            .collect();

        let mut document = Map::new();
        document.insert("nodes".to_string(), Value::Array(nodes));
        document.insert("edges".to_string(), Value::Array(edges));
        Value::Object(document)
    }

    /// Replace the contents of the store with the graph in `document`.
    ///
    /// The type index is rebuilt from each node's `type` attribute. On any
    /// error the store is left empty.
    pub fn import_from_json(&mut self, document: &Value) -> SerializationResult<()> {
        self.clear();
        if let Err(e) = self.load_document(document) {
            warn!("Import failed, graph reset to empty: {}", e);
            self.clear();
            return Err(e);
        }
        info!(
            "Imported graph with {} nodes and {} edges",
            self.node_count(),
            self.edge_count()
        );
        Ok(())
    }

    /// Render the export document as a string
    pub fn to_json_string(&self, pretty: bool) -> SerializationResult<String> {
        let document = self.export_to_json();
        let text = if pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(text)
    }

    /// Parse a graph from the text of an export document
    pub fn from_json_str(text: &str) -> SerializationResult<GraphStore> {
        let document: Value = serde_json::from_str(text)?;
        let mut store = GraphStore::new();
        store.import_from_json(&document)?;
        Ok(store)
    }

    fn load_document(&mut self, document: &Value) -> SerializationResult<()> {
        let document = document
            .as_object()
            .ok_or_else(|| malformed("document is not an object"))?;
        let nodes = array_field(document, "nodes")?;
        let edges = array_field(document, "edges")?;

        for (index, entry) in nodes.iter().enumerate() {
            let node = parse_node(entry).map_err(|e| malformed(format!("nodes[{}]: {}", index, e)))?;
            self.add_node(node)
                .map_err(|e| malformed(format!("nodes[{}]: {}", index, e)))?;
        }

        for (index, entry) in edges.iter().enumerate() {
            let (source, target, relationship, properties) =
                parse_edge(entry).map_err(|e| malformed(format!("edges[{}]: {}", index, e)))?;
            self.add_edge(&source, &target, relationship, properties)
                .map_err(|e| malformed(format!("edges[{}]: {}", index, e)))?;
        }
        Ok(())
    }
}

fn node_entry(node: &Node) -> Value {
    let mut entry = Map::new();
    for (key, value) in &node.extra {
        entry.insert(key.clone(), value.to_json());
    }
    entry.insert("id".to_string(), Value::from(node.id.as_str()));
    entry.insert("type".to_string(), Value::from(node.node_type().as_str()));
    entry.insert("name".to_string(), Value::from(node.name.as_str()));
    if let Some(description) = &node.description {
        entry.insert("description".to_string(), Value::from(description.as_str()));
    }
    for (key, value) in node.kind.string_attributes() {
        entry.insert(key.to_string(), Value::from(value));
    }
    if let Some(gap_type) = node.gap_type() {
        entry.insert("gap_type".to_string(), Value::from(gap_type.as_str()));
    }
    entry.insert("created_at".to_string(), Value::from(node.created_at));
    entry.insert("updated_at".to_string(), Value::from(node.updated_at));
    Value::Object(entry)
}

fn array_field<'a>(document: &'a Map<String, Value>, key: &str) -> SerializationResult<&'a Vec<Value>> {
    document
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(format!("missing '{}' array", key)))
}

fn required_str<'a>(entry: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    match entry.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(format!("missing '{}'", key)),
        Some(_) => Err(format!("'{}' is not a string", key)),
    }
}

fn optional_str(entry: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("'{}' is not a string", key)),
    }
}

fn optional_timestamp(entry: &Map<String, Value>, key: &str) -> Result<Option<i64>, String> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("'{}' is not an integer timestamp", key)),
    }
}

/// Slug part of an ID, used when an entry carries no name
fn name_from_id(id: &str) -> &str {
    match id.rsplit_once(':') {
        Some((_, slug)) if !slug.is_empty() => slug,
        _ => id,
    }
}

fn parse_node(entry: &Value) -> Result<Node, String> {
    let entry = entry.as_object().ok_or("entry is not an object")?;
    let id = required_str(entry, "id")?;
    let node_type: NodeType = match entry.get("type") {
        Some(Value::String(_)) => required_str(entry, "type")?,
        _ => required_str(entry, "node_type")
            .map_err(|_| "missing 'type'".to_string())?,
    }
    .parse()?;
    let name = match optional_str(entry, "name")? {
        Some(name) if !name.is_empty() => name,
        _ => name_from_id(id).to_string(),
    };

    let gap_type = if node_type == NodeType::Gap {
        required_str(entry, "gap_type")?.parse()?
    } else {
        GapType::Feature
    };
    let mut kind = NodeKind::empty(node_type, gap_type);
    for key in kind.typed_keys() {
        if let Some(value) = optional_str(entry, key)? {
            kind.set_string_attribute(key, value);
        }
    }

    let mut node = Node::new(id, name, kind).with_description(optional_str(entry, "description")?);
    if let Some(created_at) = optional_timestamp(entry, "created_at")? {
        node.created_at = created_at;
    }
    node.updated_at = optional_timestamp(entry, "updated_at")?.unwrap_or(node.created_at);

    let extra: PropertyMap = entry
        .iter()
        .filter(|(key, _)| !node.is_reserved_attribute(key))
        .map(|(key, value)| (key.clone(), PropertyValue::from_json(value)))
        .collect();
    Ok(node.with_extra(extra))
}

fn parse_edge(entry: &Value) -> Result<(NodeId, NodeId, Relationship, PropertyMap), String> {
    let entry = entry.as_object().ok_or("entry is not an object")?;
    let source = NodeId::from(required_str(entry, "source")?);
    let target = NodeId::from(required_str(entry, "target")?);
    let relationship = Relationship::from(required_str(entry, "relationship")?);
    let properties = entry
        .iter()
        .filter(|(key, _)| !EDGE_CORE_ATTRIBUTES.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), PropertyValue::from_json(value)))
        .collect();
    Ok((source, target, relationship, properties))
}
