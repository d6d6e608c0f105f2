//! Client-side entity store shared by every screen of a session.
//!
//! Entries are keyed by backend id and kept in the order the backend last
//! listed them. Every mutation bumps a revision counter so screens can
//! tell when their snapshot is stale.

use std::collections::HashMap;

use crate::models::{ClinicalRecord, Patient};

/// Anything the store can key by backend id.
pub trait Entity: Clone {
    fn key(&self) -> Option<u64>;
}

impl Entity for Patient {
    fn key(&self) -> Option<u64> {
        self.id
    }
}

impl Entity for ClinicalRecord {
    fn key(&self) -> Option<u64> {
        Some(self.id)
    }
}

/// One collection of entities keyed by id.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    order: Vec<u64>,
    entries: HashMap<u64, T>,
    loaded: bool,
    revision: u64,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
            loaded: false,
            revision: 0,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh list from the backend.
    /// Entities without an id cannot be addressed and are skipped; a
    /// repeated id keeps its first position and its last value.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.order.clear();
        self.entries.clear();
        for item in items {
            match item.key() {
                Some(id) => {
                    if self.entries.insert(id, item).is_none() {
                        self.order.push(id);
                    }
                }
                None => tracing::warn!("Skipping listed entity without an id"),
            }
        }
        self.loaded = true;
        self.revision += 1;
    }

    /// Insert or replace in place. Returns false for entities without an id.
    pub fn upsert(&mut self, item: T) -> bool {
        let Some(id) = item.key() else {
            return false;
        };
        if self.entries.insert(id, item).is_none() {
            self.order.push(id);
        }
        self.revision += 1;
        true
    }

    /// Mutate the entry with `id` in place. Returns false if absent.
    pub fn update_with<F: FnOnce(&mut T)>(&mut self, id: u64, f: F) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                f(entry);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        let removed = self.entries.remove(&id)?;
        self.order.retain(|k| *k != id);
        self.revision += 1;
        Some(removed)
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Entries in list order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Owned copy of the entries in list order.
    pub fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether a full list has been fetched since the last invalidation.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Mark the collection stale; the next screen entry refetches it.
    pub fn invalidate(&mut self) {
        self.loaded = false;
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// All entity collections of a session.
#[derive(Debug, Clone, Default)]
pub struct ClinicStore {
    pub patients: EntityStore<Patient>,
    pub records: EntityStore<ClinicalRecord>,
}

impl ClinicStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Option<u64>,
        label: &'static str,
    }

    impl Entity for Item {
        fn key(&self) -> Option<u64> {
            self.id
        }
    }

    fn item(id: u64, label: &'static str) -> Item {
        Item {
            id: Some(id),
            label,
        }
    }

    #[test]
    fn test_replace_all_keeps_backend_order() {
        let mut store = EntityStore::new();
        store.replace_all(vec![item(3, "c"), item(1, "a"), item(2, "b")]);

        let labels: Vec<_> = store.iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
        assert!(store.is_loaded());
    }

    #[test]
    fn test_replace_all_skips_missing_ids() {
        let mut store = EntityStore::new();
        store.replace_all(vec![
            item(1, "a"),
            Item {
                id: None,
                label: "ghost",
            },
        ]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = EntityStore::new();
        store.replace_all(vec![item(1, "a"), item(2, "b")]);
        assert!(store.upsert(item(1, "a2")));
        assert!(store.upsert(item(3, "c")));

        let labels: Vec<_> = store.iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["a2", "b", "c"]);
        assert!(!store.upsert(Item {
            id: None,
            label: "x"
        }));
    }

    #[test]
    fn test_remove_only_target() {
        let mut store = EntityStore::new();
        store.replace_all(vec![item(1, "a"), item(2, "b"), item(3, "c")]);
        assert_eq!(store.remove(2), Some(item(2, "b")));
        assert_eq!(store.remove(2), None);

        let ids: Vec<_> = store.iter().filter_map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut store = EntityStore::new();
        let r0 = store.revision();
        store.replace_all(vec![item(1, "a")]);
        let r1 = store.revision();
        assert!(r1 > r0);

        assert!(!store.update_with(9, |_| {}));
        assert_eq!(store.revision(), r1);

        assert!(store.update_with(1, |i| i.label = "z"));
        assert!(store.revision() > r1);
        assert_eq!(store.get(1).unwrap().label, "z");
    }

    #[test]
    fn test_invalidate() {
        let mut store: EntityStore<Item> = EntityStore::new();
        store.replace_all(vec![item(1, "a")]);
        store.invalidate();
        assert!(!store.is_loaded());
        assert_eq!(store.len(), 1);
    }
}
