//! Feature popularity ranking

use super::common::{category_members, feature_ids, resolve_category};
use crate::graph::{GraphStore, NodeId, NodeType};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureCount {
    pub feature_id: NodeId,
    pub name: String,
    /// Distinct products in scope declaring the feature
    pub count: usize,
}

/// Rank features by how many products declare them.
///
/// With a category (name or ID) only its member products are counted; an
/// unknown category yields an empty ranking. Sorted by count descending, then
/// name ascending, and truncated to `limit`.
pub fn find_popular_features(store: &GraphStore, category: Option<&str>, limit: usize) -> Vec<FeatureCount> {
    let scope: BTreeSet<&NodeId> = match category {
        Some(category) => match resolve_category(store, category) {
            Some(category_id) => category_members(store, &category_id),
            None => return Vec::new(),
        },
        None => store.node_ids_of_type(NodeType::Product).collect(),
    };

    let mut counts: HashMap<&NodeId, usize> = HashMap::new();
    for product_id in scope {
        for feature_id in feature_ids(store, product_id) {
            *counts.entry(feature_id).or_insert(0) += 1;
        }
    }

    let mut ranking: Vec<FeatureCount> = counts
        .into_iter()
        .filter_map(|(feature_id, count)| {
            store.get_node(feature_id).map(|node| FeatureCount {
                feature_id: feature_id.clone(),
                name: node.name.clone(),
                count,
            })
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.feature_id.cmp(&b.feature_id))
    });
    ranking.truncate(limit);
    ranking
}
