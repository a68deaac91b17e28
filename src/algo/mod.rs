//! Structural queries over the knowledge graph
//!
//! Every query borrows the store immutably, runs to completion and returns a
//! plain ordered result. Absence (unknown product, empty category) is an
//! empty result, never an error.

pub mod common;
pub mod gaps;
pub mod market;
pub mod popularity;
pub mod similarity;

pub use common::{
    competitors_of, find_gaps_for_product, product_features, products_in_category, FeatureSummary,
};
pub use gaps::{find_feature_gap_opportunities, find_missing_features, GapOpportunity};
pub use market::{analyze_market, MarketAnalysis};
pub use popularity::{find_popular_features, FeatureCount};
pub use similarity::{
    find_similar_products, jaccard, link_similar_products, product_similarity, SimilarProduct,
};
