//! Market overview combining category membership and feature popularity

use super::common::{category_members, resolve_category};
use super::popularity::{find_popular_features, FeatureCount};
use crate::graph::{GraphStore, NodeId, NodeType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    /// Category name, or `None` for the whole market
    pub category: Option<String>,
    pub product_count: usize,
    /// Product names in scope, ordered by product ID
    pub products: Vec<String>,
    pub popular_features: Vec<FeatureCount>,
    /// Category name -> member product count; only for whole-market analyses
    pub category_distribution: BTreeMap<String, usize>,
}

/// Summarize a category (by name or ID), or the whole market when `None`
pub fn analyze_market(store: &GraphStore, category: Option<&str>, limit: usize) -> MarketAnalysis {
    let (category_name, product_ids): (Option<String>, Vec<&NodeId>) = match category {
        Some(requested) => match resolve_category(store, requested) {
            Some(id) => {
                let name = store
                    .get_node(&id)
                    .map_or_else(|| requested.to_string(), |node| node.name.clone());
                (Some(name), category_members(store, &id).into_iter().collect())
            }
            None => (Some(requested.to_string()), Vec::new()),
        },
        None => (None, store.node_ids_of_type(NodeType::Product).collect()),
    };

    let products: Vec<String> = product_ids
        .iter()
        .filter_map(|id| store.get_node(id))
        .map(|node| node.name.clone())
        .collect();

    let mut category_distribution = BTreeMap::new();
    if category.is_none() {
        for node in store.nodes_of_type(NodeType::Category) {
            let members = category_members(store, &node.id).len();
            if members > 0 {
                category_distribution.insert(node.name.clone(), members);
            }
        }
    }

    MarketAnalysis {
        category: category_name,
        product_count: products.len(),
        products,
        popular_features: find_popular_features(store, category, limit),
        category_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Ingestor, ProductRecord};

    fn sample() -> GraphStore {
        let mut store = GraphStore::new();
        let mut ingestor = Ingestor::new(&mut store);
        ingestor
            .add_product(&ProductRecord::named("Notes").with_features(["sync"]).with_categories(["Productivity"]))
            .unwrap();
        ingestor
            .add_product(&ProductRecord::named("Tasks").with_features(["sync", "kanban"]).with_categories(["Productivity"]))
            .unwrap();
        ingestor
            .add_product(&ProductRecord::named("Ledger").with_features(["invoices"]).with_categories(["Finance"]))
            .unwrap();
        store
    }

    #[test]
    fn test_whole_market() {
        let store = sample();
        let analysis = analyze_market(&store, None, 1);
        assert_eq!(analysis.category, None);
        assert_eq!(analysis.product_count, 3);
        assert_eq!(analysis.products, vec!["Ledger", "Notes", "Tasks"]);
        assert_eq!(analysis.popular_features.len(), 1);
        assert_eq!(analysis.popular_features[0].name, "sync");
        assert_eq!(analysis.category_distribution.get("Productivity"), Some(&2));
        assert_eq!(analysis.category_distribution.get("Finance"), Some(&1));
    }

    #[test]
    fn test_single_category() {
        let store = sample();
        let analysis = analyze_market(&store, Some("productivity"), 10);
        assert_eq!(analysis.category.as_deref(), Some("Productivity"));
        assert_eq!(analysis.products, vec!["Notes", "Tasks"]);
        assert_eq!(analysis.popular_features[0].count, 2);
        assert!(analysis.category_distribution.is_empty());
    }

    #[test]
    fn test_unknown_category() {
        let store = sample();
        let analysis = analyze_market(&store, Some("Gaming"), 10);
        assert_eq!(analysis.product_count, 0);
        assert!(analysis.popular_features.is_empty());
    }
}
