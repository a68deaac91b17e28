//! Core knowledge graph implementation
//!
//! This module implements the typed graph model:
//! - Nodes with a type discriminator, typed attributes and open extras
//! - Labelled edges with properties, unique per (source, target, relationship)
//! - In-memory storage with a per-type index and adjacency lists

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::{Edge, EDGE_CORE_ATTRIBUTES};
pub use node::{Node, NodeKind, CORE_ATTRIBUTES};
pub use property::{merge_properties, PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStatistics, GraphStore};
pub use types::{slugify, EdgeId, GapType, NodeId, NodeType, Relationship};
