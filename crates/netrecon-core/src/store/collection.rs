// ── Generic entity collection ──
//
// Concurrent keyed storage that remembers insertion order, so enumeration
// (and therefore first-match subnet resolution) is stable across calls.

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

/// A concurrent collection for a single row type.
///
/// `DashMap` gives O(1) keyed access; the key order lives in an `ArcSwap`'d
/// vector that is only rebuilt when a new key arrives.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    /// Primary storage: key string -> row.
    /// Keys carry a kind prefix (e.g. `"net:{id}"`, `"ip:{addr}@{subnet}"`).
    by_key: DashMap<String, Arc<T>>,

    /// Keys in first-insertion order.
    order: ArcSwap<Vec<String>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        Self {
            by_key: DashMap::new(),
            order: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Insert or replace a row. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, entity: T) -> bool {
        let is_new = self.by_key.insert(key.clone(), Arc::new(entity)).is_none();
        if is_new {
            self.order.rcu(|keys| {
                let mut next = Vec::clone(keys);
                next.push(key.clone());
                next
            });
        }
        is_new
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// All rows in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.order.load().iter().filter_map(|k| self.get(k)).collect()
    }

    /// First row, in insertion order, satisfying `pred`.
    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<Arc<T>> {
        self.order
            .load()
            .iter()
            .filter_map(|k| self.get(k))
            .find(|row| pred(row))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }
}
