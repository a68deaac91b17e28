//! SaaS Knowledge Graph
//!
//! An in-memory typed graph of SaaS products, their features, categories,
//! makers, user needs and the market gaps found between them, together with
//! the structural queries used to analyse it.
//!
//! # Layout
//!
//! - [`graph`]: typed nodes and labelled edges in a [`GraphStore`] with a
//!   per-type index
//! - [`ingest`]: merge-on-exists ingestion of product, gap, company and
//!   user-need records
//! - [`algo`]: feature similarity, gap opportunities, missing features,
//!   feature popularity and market summaries
//! - [`serialization`]: the `{nodes, edges}` JSON document
//! - [`persistence`]: repositories that load and save a whole graph
//! - [`config`]: settings for the binaries
//!
//! ## Example Usage
//!
//! ```rust
//! use saas_kg::algo::{find_feature_gap_opportunities, find_popular_features, find_similar_products};
//! use saas_kg::ingest::{Ingestor, ProductRecord};
//! use saas_kg::GraphStore;
//!
//! let mut store = GraphStore::new();
//! let mut ingestor = Ingestor::new(&mut store);
//!
//! let a = ingestor
//!     .add_product(&ProductRecord::named("A").with_features(["x", "y", "z"]))
//!     .unwrap();
//! ingestor
//!     .add_product(&ProductRecord::named("B").with_features(["y", "z", "w"]))
//!     .unwrap();
//!
//! let similar = find_similar_products(&store, &a, 0.3);
//! assert_eq!(similar[0].product_id.as_str(), "product:b");
//! assert_eq!(similar[0].score, 0.5);
//!
//! // y and z are owned by every product, x and w by only one
//! assert!(find_feature_gap_opportunities(&store, 2).is_empty());
//!
//! let popular = find_popular_features(&store, None, 2);
//! assert_eq!(popular[0].name, "y");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod graph;
pub mod ingest;
pub mod persistence;
pub mod serialization;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, GapType, GraphError, GraphResult, GraphStatistics, GraphStore, Node, NodeId,
    NodeKind, NodeType, PropertyMap, PropertyValue, Relationship,
};

pub use ingest::{CompanyRecord, GapRecord, Ingestor, ProductRecord, UserNeedRecord};

pub use persistence::{
    JsonFileRepository, MemoryRepository, PersistenceError, PersistenceResult, Repository,
};

pub use serialization::{SerializationError, SerializationResult};

pub use config::{ConfigError, KgConfig, QueryDefaults};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
