//! Edge implementation for the knowledge graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, NodeId, Relationship};
use serde::{Deserialize, Serialize};

/// Keys of an exported edge entry that properties may not use
pub const EDGE_CORE_ATTRIBUTES: [&str; 3] = ["source", "target", "relationship"];

/// An edge between two nodes
///
/// Edges are stored with the direction the caller supplied. For symmetric
/// relationships the direction is incidental and a pair of nodes holds at
/// most one such edge, keeping the direction of the first write; for
/// `suggests`, `addressed_by` and `identified_in` it reads source → target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,

    pub source: NodeId,

    pub target: NodeId,

    /// Relationship label (e.g. `has_feature`, `competes_with`)
    pub relationship: Relationship,

    /// Properties associated with this edge
    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Edge {
    /// Create a new edge with properties
    pub fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        relationship: Relationship,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            source,
            target,
            relationship,
            properties,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint at all
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }
}
