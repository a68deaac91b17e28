//! Product similarity over shared features
//!
//! Two products are compared by the Jaccard index of their feature sets:
//! `|A ∩ B| / |A ∪ B|`, defined as 0 when either set is empty.

use super::common::{feature_ids, is_product};
use crate::graph::{GraphResult, GraphStore, NodeId, NodeType, PropertyMap, PropertyValue, Relationship};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// A product scored against a reference product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarProduct {
    pub product_id: NodeId,
    pub score: f64,
}

/// Jaccard similarity of two sets; 0 when either is empty
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Similarity between two products by their features
pub fn product_similarity(store: &GraphStore, a: &NodeId, b: &NodeId) -> f64 {
    jaccard(&feature_ids(store, a), &feature_ids(store, b))
}

/// Products whose similarity to `product_id` is at least `threshold`,
/// best first, ties broken by product ID.
///
/// An unknown product yields an empty list.
pub fn find_similar_products(store: &GraphStore, product_id: &NodeId, threshold: f64) -> Vec<SimilarProduct> {
    if !is_product(store, product_id) {
        return Vec::new();
    }
    let reference = feature_ids(store, product_id);

    let mut results: Vec<SimilarProduct> = store
        .node_ids_of_type(NodeType::Product)
        .filter(|other| *other != product_id)
        .map(|other| SimilarProduct {
            product_id: other.clone(),
            score: jaccard(&reference, &feature_ids(store, other)),
        })
        .filter(|candidate| candidate.score >= threshold)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    results
}

/// Record a `similar_to` edge for every pair of products that share at
/// least one feature and score at or above `threshold`.
///
/// Each edge carries `similarity` and the sorted `common_features` IDs and
/// runs from the lower to the higher product ID. Returns the number of pairs
/// linked.
pub fn link_similar_products(store: &mut GraphStore, threshold: f64) -> GraphResult<usize> {
    let products: Vec<NodeId> = store.node_ids_of_type(NodeType::Product).cloned().collect();

    let mut links = Vec::new();
    for (i, a) in products.iter().enumerate() {
        let features_a = feature_ids(store, a);
        for b in &products[i + 1..] {
            let features_b = feature_ids(store, b);
            let common: Vec<PropertyValue> = features_a
                .intersection(&features_b)
                .map(|id| PropertyValue::from(id.as_str()))
                .collect();
            let score = jaccard(&features_a, &features_b);
            if common.is_empty() || score < threshold {
                continue;
            }
            let mut properties = PropertyMap::new();
            properties.insert("similarity".to_string(), PropertyValue::Float(score));
            properties.insert("common_features".to_string(), PropertyValue::Array(common));
            links.push((a.clone(), b.clone(), properties));
        }
    }

    let count = links.len();
    for (a, b, properties) in links {
        store.add_edge(&a, &b, Relationship::SimilarTo, properties)?;
    }
    info!("Linked {} similar product pairs (threshold {})", count, threshold);
    Ok(count)
}
