//! In-memory graph storage implementation
//!
//! The store owns every node and edge and keeps three derived structures in
//! step with them on each write:
//! - a per-type index (`NodeType -> {NodeId}`)
//! - outgoing/incoming adjacency lists
//! - an edge key map so that `(source, target, relationship)` is unique;
//!   symmetric relationships are keyed by the unordered pair of endpoints
//!
//! Nothing else may mutate a node's kind, which is what keeps the type index
//! from drifting away from the node table.

use super::edge::{Edge, EDGE_CORE_ATTRIBUTES};
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, NodeId, NodeType, Relationship};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Invalid input: {field} {reason}")]
    Validation { field: String, reason: String },

    #[error("Node {id} already exists as {existing}, cannot add it as {requested}")]
    NodeTypeMismatch {
        id: NodeId,
        existing: NodeType,
        requested: NodeType,
    },
}

impl GraphError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

type EdgeKey = (NodeId, NodeId, Relationship);

fn edge_key(source: &NodeId, target: &NodeId, relationship: &Relationship) -> EdgeKey {
    if relationship.keeps_direction() || source <= target {
        (source.clone(), target.clone(), relationship.clone())
    } else {
        (target.clone(), source.clone(), relationship.clone())
    }
}

/// Summary counts over the whole graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub edges_by_relationship: BTreeMap<String, usize>,
}

/// In-memory knowledge graph storage
///
/// - nodes: NodeId -> Node, in insertion order so exports are stable
/// - edges: arena indexed by EdgeId
/// - outgoing / incoming: NodeId -> Vec<EdgeId>
/// - type_index: NodeType -> sorted set of NodeId
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,

    edges: Vec<Edge>,

    /// Lookup used to overwrite instead of duplicating an edge
    edge_keys: HashMap<EdgeKey, EdgeId>,

    outgoing: HashMap<NodeId, Vec<EdgeId>>,

    incoming: HashMap<NodeId, Vec<EdgeId>>,

    type_index: HashMap<NodeType, BTreeSet<NodeId>>,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or merge it into the existing node with the same ID.
    ///
    /// Fails with [`GraphError::NodeTypeMismatch`] if the ID is already taken
    /// by a node of a different type, and with a validation error if an extra
    /// attribute shadows a core or typed attribute.
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeId> {
        if let Some(key) = node.reserved_extra_key() {
            return Err(GraphError::validation(key, "is a reserved attribute"));
        }
        let id = node.id.clone();
        if let Some(existing) = self.nodes.get_mut(&id) {
            let (existing_type, requested) = (existing.node_type(), node.node_type());
            if existing_type != requested {
                return Err(GraphError::NodeTypeMismatch {
                    id,
                    existing: existing_type,
                    requested,
                });
            }
            existing.merge(node);
            debug!("Merged node {}", id);
            return Ok(id);
        }

        self.type_index
            .entry(node.node_type())
            .or_default()
            .insert(id.clone());
        self.nodes.insert(id.clone(), node);
        debug!("Created node {}", id);
        Ok(id)
    }

    /// Add an edge, or overwrite the properties of the existing edge with the
    /// same endpoints and relationship. For symmetric relationships other
    /// than `competes_with`, `b -> a` matches an existing `a -> b`.
    ///
    /// Both endpoints must already exist; otherwise the store is left unchanged.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship: Relationship,
        properties: PropertyMap,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::UnknownNode(source.clone()));
        }
        if !self.has_node(target) {
            return Err(GraphError::UnknownNode(target.clone()));
        }
        if let Some(key) = properties
            .keys()
            .find(|key| EDGE_CORE_ATTRIBUTES.contains(&key.as_str()))
        {
            return Err(GraphError::validation(key.as_str(), "is a reserved edge attribute"));
        }

        let key = edge_key(source, target, &relationship);
        if let Some(&edge_id) = self.edge_keys.get(&key) {
            if let Some(edge) = self.edges.get_mut(edge_id.as_u64() as usize) {
                edge.properties = properties;
            }
            return Ok(edge_id);
        }

        let edge_id = EdgeId::new(self.edges.len() as u64);
        let edge = Edge::new(
            edge_id,
            source.clone(),
            target.clone(),
            relationship,
            properties,
        );
        self.outgoing.entry(source.clone()).or_default().push(edge_id);
        self.incoming.entry(target.clone()).or_default().push(edge_id);
        self.edge_keys.insert(key, edge_id);
        self.edges.push(edge);
        Ok(edge_id)
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Fail with [`GraphError::NodeTypeMismatch`] if `id` is taken by a node
    /// of another type. Absent IDs pass.
    pub fn check_node_type(&self, id: &NodeId, node_type: NodeType) -> GraphResult<()> {
        match self.nodes.get(id) {
            Some(node) if node.node_type() != node_type => Err(GraphError::NodeTypeMismatch {
                id: id.clone(),
                existing: node.node_type(),
                requested: node_type,
            }),
            _ => Ok(()),
        }
    }

    /// Set an extra attribute on an existing node
    pub fn set_node_property(
        &mut self,
        id: &NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
        let key: String = key.into();
        if node.is_reserved_attribute(&key) {
            return Err(GraphError::validation(key, "is a reserved attribute"));
        }
        Ok(node.set_property(key, value))
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.as_u64() as usize)
    }

    /// Find the edge between `source` and `target` with `relationship`.
    /// Either order matches when the relationship is symmetric.
    pub fn find_edge(
        &self,
        source: &NodeId,
        target: &NodeId,
        relationship: &Relationship,
    ) -> Option<&Edge> {
        let key = edge_key(source, target, relationship);
        self.edge_keys.get(&key).and_then(|id| self.get_edge(*id))
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, id: &NodeId) -> Vec<&Edge> {
        self.collect_edges(self.outgoing.get(id))
    }

    /// Get all incoming edges to a node
    pub fn get_incoming_edges(&self, id: &NodeId) -> Vec<&Edge> {
        self.collect_edges(self.incoming.get(id))
    }

    fn collect_edges(&self, ids: Option<&Vec<EdgeId>>) -> Vec<&Edge> {
        ids.map(|ids| ids.iter().filter_map(|id| self.get_edge(*id)).collect())
            .unwrap_or_default()
    }

    /// Nodes adjacent to `id` regardless of edge direction, optionally
    /// restricted to one relationship. Unknown IDs have no neighbors.
    pub fn neighbors(&self, id: &NodeId, relationship: Option<&Relationship>) -> Vec<&NodeId> {
        self.neighbor_set(id, relationship).into_iter().collect()
    }

    /// Neighbors of `id` that are of `node_type`
    pub fn neighbors_of_type(
        &self,
        id: &NodeId,
        node_type: NodeType,
        relationship: Option<&Relationship>,
    ) -> BTreeSet<&NodeId> {
        self.neighbor_set(id, relationship)
            .into_iter()
            .filter(|n| {
                self.get_node(n)
                    .map(|node| node.node_type() == node_type)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn neighbor_set(&self, id: &NodeId, relationship: Option<&Relationship>) -> BTreeSet<&NodeId> {
        self.get_outgoing_edges(id)
            .into_iter()
            .chain(self.get_incoming_edges(id))
            .filter(|edge| relationship.map_or(true, |rel| &edge.relationship == rel))
            .filter_map(|edge| edge.other_end(id))
            .collect()
    }

    /// All nodes of a type, ordered by ID
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<&Node> {
        self.node_ids_of_type(node_type)
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// IDs of all nodes of a type, ordered
    pub fn node_ids_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &NodeId> {
        self.type_index
            .get(&node_type)
            .into_iter()
            .flat_map(|ids| ids.iter())
    }

    pub fn count_of_type(&self, node_type: NodeType) -> usize {
        self.type_index.get(&node_type).map_or(0, |ids| ids.len())
    }

    /// All nodes in insertion order
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in insertion order
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Clear all data
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.edge_keys.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.type_index.clear();
    }

    pub fn statistics(&self) -> GraphStatistics {
        let mut stats = GraphStatistics {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..Default::default()
        };
        for node_type in NodeType::ALL {
            let count = self.count_of_type(node_type);
            if count > 0 {
                stats.nodes_by_type.insert(node_type, count);
            }
        }
        for edge in &self.edges {
            *stats
                .edges_by_relationship
                .entry(edge.relationship.to_string())
                .or_insert(0) += 1;
        }
        stats
    }

    /// Whether the type index matches the node table exactly
    pub fn index_is_consistent(&self) -> bool {
        let indexed: usize = self.type_index.values().map(|ids| ids.len()).sum();
        indexed == self.nodes.len()
            && self.nodes.values().all(|node| {
                self.type_index
                    .get(&node.node_type())
                    .map_or(false, |ids| ids.contains(&node.id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::NodeKind;
    use crate::graph::types::GapType;

    fn feature(name: &str) -> Node {
        Node::new(NodeId::for_entity(NodeType::Feature, name), name, NodeKind::Feature)
    }

    fn product(name: &str) -> Node {
        Node::new(
            NodeId::for_entity(NodeType::Product, name),
            name,
            NodeKind::empty(NodeType::Product, GapType::Feature),
        )
    }

    #[test]
    fn test_add_and_get_node() {
        let mut store = GraphStore::new();
        let id = store.add_node(product("Acme")).unwrap();

        assert_eq!(store.node_count(), 1);
        let node = store.get_node(&id).unwrap();
        assert_eq!(node.name, "Acme");
        assert_eq!(node.node_type(), NodeType::Product);
        assert!(store.get_node(&NodeId::from("product:nope")).is_none());
    }

    #[test]
    fn test_add_node_merges_existing() {
        let mut store = GraphStore::new();
        store.add_node(feature("Dark mode")).unwrap();
        let mut again = feature("dark mode");
        again.set_property("beta", true);
        let id = store.add_node(again).unwrap();

        assert_eq!(store.node_count(), 1);
        assert_eq!(store.count_of_type(NodeType::Feature), 1);
        let node = store.get_node(&id).unwrap();
        assert_eq!(node.name, "Dark mode");
        assert_eq!(node.get_property("beta"), Some(&PropertyValue::Boolean(true)));
    }

    #[test]
    fn test_add_node_type_mismatch() {
        let mut store = GraphStore::new();
        store.add_node(Node::new("x:1", "one", NodeKind::Feature)).unwrap();
        let result = store.add_node(Node::new("x:1", "one", NodeKind::Category));
        assert_eq!(
            result,
            Err(GraphError::NodeTypeMismatch {
                id: NodeId::from("x:1"),
                existing: NodeType::Feature,
                requested: NodeType::Category,
            })
        );
        assert!(store.index_is_consistent());
    }

    #[test]
    fn test_edge_validation_leaves_store_unchanged() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let ghost = NodeId::from("feature:ghost");

        let result = store.add_edge(&a, &ghost, Relationship::HasFeature, PropertyMap::new());
        assert_eq!(result, Err(GraphError::UnknownNode(ghost.clone())));

        let result = store.add_edge(&ghost, &a, Relationship::HasFeature, PropertyMap::new());
        assert_eq!(result, Err(GraphError::UnknownNode(ghost)));

        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.node_count(), 1);
        assert!(store.neighbors(&a, None).is_empty());
    }

    #[test]
    fn test_readding_edge_overwrites_properties() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let b = store.add_node(product("B")).unwrap();

        let mut props = PropertyMap::new();
        props.insert("similarity".to_string(), 0.4.into());
        let first = store
            .add_edge(&a, &b, Relationship::SimilarTo, props)
            .unwrap();

        let mut props = PropertyMap::new();
        props.insert("similarity".to_string(), 0.6.into());
        let second = store
            .add_edge(&a, &b, Relationship::SimilarTo, props)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.edge_count(), 1);
        let edge = store.find_edge(&a, &b, &Relationship::SimilarTo).unwrap();
        assert_eq!(edge.get_property("similarity").unwrap().as_float(), Some(0.6));

        // A different relationship between the same nodes is a separate edge
        store
            .add_edge(&a, &b, Relationship::CompetesWith, PropertyMap::new())
            .unwrap();
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn test_reversed_symmetric_edge_overwrites() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let b = store.add_node(product("B")).unwrap();
        let x = store.add_node(feature("x")).unwrap();

        let mut props = PropertyMap::new();
        props.insert("similarity".to_string(), 0.5.into());
        let first = store.add_edge(&a, &b, Relationship::SimilarTo, props).unwrap();
        let mut props = PropertyMap::new();
        props.insert("similarity".to_string(), 0.9.into());
        let second = store.add_edge(&b, &a, Relationship::SimilarTo, props).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.edge_count(), 1);
        let edge = store.find_edge(&b, &a, &Relationship::SimilarTo).unwrap();
        assert_eq!(edge.source, a);
        assert_eq!(edge.get_property("similarity").unwrap().as_float(), Some(0.9));

        store.add_edge(&a, &x, Relationship::HasFeature, PropertyMap::new()).unwrap();
        store.add_edge(&x, &a, Relationship::HasFeature, PropertyMap::new()).unwrap();
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.neighbors(&x, None), vec![&a]);
    }

    #[test]
    fn test_competes_with_and_directed_edges_keep_both_directions() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let b = store.add_node(product("B")).unwrap();

        store.add_edge(&a, &b, Relationship::CompetesWith, PropertyMap::new()).unwrap();
        store.add_edge(&b, &a, Relationship::CompetesWith, PropertyMap::new()).unwrap();
        store.add_edge(&a, &b, Relationship::Suggests, PropertyMap::new()).unwrap();
        store.add_edge(&b, &a, Relationship::Suggests, PropertyMap::new()).unwrap();

        assert_eq!(store.edge_count(), 4);
        assert_eq!(store.find_edge(&b, &a, &Relationship::Suggests).unwrap().source, b);
    }

    #[test]
    fn test_check_node_type() {
        let mut store = GraphStore::new();
        let x = store.add_node(Node::new("feature:x", "x", NodeKind::Category)).unwrap();

        assert!(store.check_node_type(&x, NodeType::Category).is_ok());
        assert!(store.check_node_type(&NodeId::from("feature:y"), NodeType::Feature).is_ok());
        assert_eq!(
            store.check_node_type(&x, NodeType::Feature),
            Err(GraphError::NodeTypeMismatch {
                id: x.clone(),
                existing: NodeType::Category,
                requested: NodeType::Feature,
            })
        );
    }

    #[test]
    fn test_neighbors_ignore_direction() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let x = store.add_node(feature("x")).unwrap();
        let y = store.add_node(feature("y")).unwrap();
        store.add_edge(&a, &x, Relationship::HasFeature, PropertyMap::new()).unwrap();
        store.add_edge(&y, &a, Relationship::Custom("inspired".into()), PropertyMap::new()).unwrap();

        assert_eq!(store.neighbors(&a, None), vec![&x, &y]);
        assert_eq!(store.neighbors(&a, Some(&Relationship::HasFeature)), vec![&x]);
        assert_eq!(store.neighbors(&x, None), vec![&a]);
        assert!(store.neighbors(&NodeId::from("product:none"), None).is_empty());

        assert_eq!(store.get_outgoing_edges(&a).len(), 1);
        assert_eq!(store.get_incoming_edges(&a).len(), 1);
    }

    #[test]
    fn test_nodes_of_type_sorted_by_id() {
        let mut store = GraphStore::new();
        store.add_node(product("Zeta")).unwrap();
        store.add_node(product("Alpha")).unwrap();
        store.add_node(feature("x")).unwrap();

        let names: Vec<&str> = store
            .nodes_of_type(NodeType::Product)
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert!(store.nodes_of_type(NodeType::Company).is_empty());
        assert!(store.index_is_consistent());
    }

    #[test]
    fn test_reserved_attributes_rejected() {
        let mut store = GraphStore::new();
        let mut node = feature("x");
        node.set_property("type", "product");
        assert_eq!(
            store.add_node(node),
            Err(GraphError::validation("type", "is a reserved attribute"))
        );

        let a = store.add_node(product("A")).unwrap();
        let x = store.add_node(feature("x")).unwrap();
        assert!(store.set_node_property(&a, "pricing", "free").is_err());

        let mut props = PropertyMap::new();
        props.insert("source".to_string(), "elsewhere".into());
        assert!(store.add_edge(&a, &x, Relationship::HasFeature, props).is_err());
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_set_node_property() {
        let mut store = GraphStore::new();
        let id = store.add_node(feature("x")).unwrap();
        store.set_node_property(&id, "votes", 3i64).unwrap();
        assert_eq!(
            store.get_node(&id).unwrap().get_property("votes"),
            Some(&PropertyValue::Integer(3))
        );

        let missing = NodeId::from("feature:none");
        assert_eq!(
            store.set_node_property(&missing, "votes", 1i64),
            Err(GraphError::UnknownNode(missing))
        );
    }

    #[test]
    fn test_statistics() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let x = store.add_node(feature("x")).unwrap();
        store.add_edge(&a, &x, Relationship::HasFeature, PropertyMap::new()).unwrap();

        let stats = store.statistics();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.nodes_by_type.get(&NodeType::Product), Some(&1));
        assert_eq!(stats.edges_by_relationship.get("has_feature"), Some(&1));
    }

    #[test]
    fn test_clear() {
        let mut store = GraphStore::new();
        let a = store.add_node(product("A")).unwrap();
        let x = store.add_node(feature("x")).unwrap();
        store.add_edge(&a, &x, Relationship::HasFeature, PropertyMap::new()).unwrap();

        store.clear();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.count_of_type(NodeType::Product), 0);
        assert!(store.find_edge(&a, &x, &Relationship::HasFeature).is_none());
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GraphStore>();
    }
}
