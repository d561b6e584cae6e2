//! Snapshots - durable identities of scanned components

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered component at the time of the current scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    /// Durable identifier of the scanned resource
    pub resource_id: i64,
    pub component_key: String,
}

impl Snapshot {
    pub fn new(id: i64, resource_id: i64, component_key: impl Into<String>) -> Self {
        Self {
            id,
            resource_id,
            component_key: component_key.into(),
        }
    }
}

/// Resolves a component key to its snapshot.
///
/// `None` means the component was never registered.
pub trait SnapshotLookup {
    fn get(&self, component_key: &str) -> Option<Snapshot>;
}

/// Snapshots registered during the current scan, one per component key
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    snapshots: HashMap<String, Snapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot, replacing any previous one for the same component
    pub fn put(&mut self, snapshot: Snapshot) {
        self.snapshots.insert(snapshot.component_key.clone(), snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotLookup for SnapshotCache {
    fn get(&self, component_key: &str) -> Option<Snapshot> {
        self.snapshots.get(component_key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_registered_component() {
        let mut cache = SnapshotCache::new();
        cache.put(Snapshot::new(1, 42, "comp-A"));

        let snapshot = cache.get("comp-A").unwrap();
        assert_eq!(snapshot.resource_id, 42);
        assert!(cache.get("comp-B").is_none());
    }

    #[test]
    fn test_put_replaces_same_component() {
        let mut cache = SnapshotCache::new();
        cache.put(Snapshot::new(1, 42, "comp-A"));
        cache.put(Snapshot::new(2, 43, "comp-A"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("comp-A").unwrap().id, 2);
    }
}
