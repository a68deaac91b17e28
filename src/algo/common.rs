//! Shared lookups used by the structural queries
//!
//! All functions here are total: unknown IDs or names yield empty results.

use crate::graph::{GraphStore, NodeId, NodeType, Relationship};
use serde::Serialize;
use std::collections::BTreeSet;

/// A feature as reported in query results
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FeatureSummary {
    pub id: NodeId,
    pub name: String,
}

/// Feature neighbors of a product, whatever the relationship
pub fn feature_ids<'a>(store: &'a GraphStore, product_id: &NodeId) -> BTreeSet<&'a NodeId> {
    store.neighbors_of_type(product_id, NodeType::Feature, None)
}

/// Product neighbors of a feature
pub fn feature_owners<'a>(store: &'a GraphStore, feature_id: &NodeId) -> BTreeSet<&'a NodeId> {
    store.neighbors_of_type(feature_id, NodeType::Product, None)
}

pub fn is_product(store: &GraphStore, id: &NodeId) -> bool {
    store
        .get_node(id)
        .map_or(false, |node| node.node_type() == NodeType::Product)
}

pub(crate) fn summarize<'a>(
    store: &GraphStore,
    ids: impl IntoIterator<Item = &'a NodeId>,
) -> Vec<FeatureSummary> {
    ids.into_iter()
        .filter_map(|id| store.get_node(id))
        .map(|node| FeatureSummary {
            id: node.id.clone(),
            name: node.name.clone(),
        })
        .collect()
}

/// Features of a product, ordered by ID
pub fn product_features(store: &GraphStore, product_id: &NodeId) -> Vec<FeatureSummary> {
    summarize(store, feature_ids(store, product_id))
}

/// Recorded competitors of a product
pub fn competitors_of(store: &GraphStore, product_id: &NodeId) -> Vec<NodeId> {
    if !is_product(store, product_id) {
        return Vec::new();
    }
    store
        .neighbors_of_type(product_id, NodeType::Product, Some(&Relationship::CompetesWith))
        .into_iter()
        .cloned()
        .collect()
}

/// Resolve a category given either by ID or by name
pub fn resolve_category(store: &GraphStore, category: &str) -> Option<NodeId> {
    let by_id = NodeId::from(category);
    let candidate = match store.get_node(&by_id) {
        Some(node) if node.node_type() == NodeType::Category => by_id,
        _ => NodeId::for_entity(NodeType::Category, category),
    };
    store
        .get_node(&candidate)
        .filter(|node| node.node_type() == NodeType::Category)
        .map(|node| node.id.clone())
}

/// Members of a category linked through `contains` or `belongs_to`
pub(crate) fn category_members<'a>(store: &'a GraphStore, category_id: &NodeId) -> BTreeSet<&'a NodeId> {
    let mut members =
        store.neighbors_of_type(category_id, NodeType::Product, Some(&Relationship::Contains));
    members.extend(store.neighbors_of_type(
        category_id,
        NodeType::Product,
        Some(&Relationship::BelongsTo),
    ));
    members
}

/// Products in a category given by name or ID
pub fn products_in_category(store: &GraphStore, category: &str) -> Vec<NodeId> {
    resolve_category(store, category)
        .map(|id| category_members(store, &id).into_iter().cloned().collect())
        .unwrap_or_default()
}

/// Gaps identified in a product
pub fn find_gaps_for_product(store: &GraphStore, product_id: &NodeId) -> Vec<NodeId> {
    if !is_product(store, product_id) {
        return Vec::new();
    }
    store
        .neighbors_of_type(product_id, NodeType::Gap, Some(&Relationship::IdentifiedIn))
        .into_iter()
        .cloned()
        .collect()
}
