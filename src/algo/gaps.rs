//! Feature-gap analysis
//!
//! A gap opportunity is a feature declared by at least `min_products`
//! products while at least one other known product lacks it.

use super::common::{competitors_of, feature_ids, feature_owners, is_product, summarize, FeatureSummary};
use crate::graph::{GraphStore, NodeId, NodeType};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapOpportunity {
    pub feature_id: NodeId,
    /// Products lacking the feature, ordered by ID
    pub missing_products: Vec<NodeId>,
    /// Share of products that already have the feature
    pub opportunity_strength: f64,
}

/// Features common to at least `min_products` products but absent from
/// some others, strongest first (ties by feature ID).
pub fn find_feature_gap_opportunities(store: &GraphStore, min_products: usize) -> Vec<GapOpportunity> {
    let all_products: BTreeSet<&NodeId> = store.node_ids_of_type(NodeType::Product).collect();

    let mut opportunities: Vec<GapOpportunity> = store
        .node_ids_of_type(NodeType::Feature)
        .filter_map(|feature_id| {
            let owners = feature_owners(store, feature_id);
            if owners.len() < min_products {
                return None;
            }
            let missing: Vec<NodeId> = all_products.difference(&owners).map(|id| (*id).clone()).collect();
            if missing.is_empty() {
                return None;
            }
            let strength = owners.len() as f64 / (owners.len() + missing.len()) as f64;
            Some(GapOpportunity {
                feature_id: feature_id.clone(),
                missing_products: missing,
                opportunity_strength: strength,
            })
        })
        .collect();

    opportunities.sort_by(|a, b| {
        b.opportunity_strength
            .total_cmp(&a.opportunity_strength)
            .then_with(|| a.feature_id.cmp(&b.feature_id))
    });
    opportunities
}

/// Features each competitor has that `product_id` lacks.
///
/// With `competitors = None` the product's recorded competitors are used.
/// Competitors with nothing missing, and IDs that are not products, are
/// left out of the map.
pub fn find_missing_features(
    store: &GraphStore,
    product_id: &NodeId,
    competitors: Option<&[NodeId]>,
) -> BTreeMap<NodeId, Vec<FeatureSummary>> {
    if !is_product(store, product_id) {
        return BTreeMap::new();
    }
    let own = feature_ids(store, product_id);
    let competitors: Vec<NodeId> = match competitors {
        Some(ids) => ids.to_vec(),
        None => competitors_of(store, product_id),
    };

    competitors
        .into_iter()
        .filter(|id| id != product_id && is_product(store, id))
        .filter_map(|competitor| {
            let theirs = feature_ids(store, &competitor);
            let missing = summarize(store, theirs.difference(&own).copied());
            if missing.is_empty() {
                None
            } else {
                Some((competitor, missing))
            }
        })
        .collect()
}
