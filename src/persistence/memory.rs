//! In-memory repository holding a serialized snapshot

use super::{PersistenceResult, Repository};
use crate::graph::GraphStore;
use std::sync::{Mutex, PoisonError};

/// Keeps the last saved graph as its JSON text, so that loading always yields
/// an independent copy
#[derive(Debug, Default)]
pub struct MemoryRepository {
    snapshot: Mutex<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything has been saved yet
    pub fn is_empty(&self) -> bool {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Repository for MemoryRepository {
    fn load(&self) -> PersistenceResult<GraphStore> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        match snapshot.as_deref() {
            Some(text) => Ok(GraphStore::from_json_str(text)?),
            None => Ok(GraphStore::new()),
        }
    }

    fn save(&self, store: &GraphStore) -> PersistenceResult<()> {
        let text = store.to_json_string(false)?;
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, NodeKind, NodeId};

    #[test]
    fn test_load_returns_independent_copy() {
        let repo = MemoryRepository::new();
        assert!(repo.is_empty());
        assert_eq!(repo.load().unwrap().node_count(), 0);

        let mut store = GraphStore::new();
        store
            .add_node(Node::new("feature:sso", "SSO", NodeKind::Feature))
            .unwrap();
        repo.save(&store).unwrap();
        assert!(!repo.is_empty());

        let mut loaded = repo.load().unwrap();
        loaded
            .add_node(Node::new("feature:audit_log", "Audit log", NodeKind::Feature))
            .unwrap();

        let again = repo.load().unwrap();
        assert_eq!(again.node_count(), 1);
        assert!(again.has_node(&NodeId::from("feature:sso")));
    }
}
