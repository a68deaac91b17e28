//! Persistence layer for the knowledge graph
//!
//! Graph algorithms never touch storage. Callers load a [`GraphStore`] from a
//! [`Repository`], work on it in memory and decide when to save it back.

pub mod file;
pub mod memory;

pub use file::JsonFileRepository;
pub use memory::MemoryRepository;

use crate::graph::GraphStore;
use crate::serialization::SerializationError;
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Somewhere a whole graph can be loaded from and saved to
pub trait Repository {
    /// Load the stored graph; an empty store if nothing was saved yet
    fn load(&self) -> PersistenceResult<GraphStore>;

    /// Replace the stored graph with `store`
    fn save(&self, store: &GraphStore) -> PersistenceResult<()>;
}
