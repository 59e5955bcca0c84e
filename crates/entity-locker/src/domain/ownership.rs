//! # Thread-Ownership Index
//!
//! Per (thread, category) set of entity ids held by that thread. Drives the
//! escalation decision, global-lock eligibility and bulk release on
//! escalation.

use super::entities::LockKey;
use std::collections::{HashMap, HashSet};
use std::thread::ThreadId;

/// Thread -> category -> held entity ids.
///
/// Empty sets and empty per-thread maps are dropped eagerly.
#[derive(Debug)]
pub struct OwnershipIndex<K, C> {
    threads: HashMap<ThreadId, HashMap<C, HashSet<K>>>,
}

impl<K: LockKey, C: LockKey> OwnershipIndex<K, C> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            threads: HashMap::new(),
        }
    }

    /// Record that `thread` holds `id` in `category`.
    pub fn bind(&mut self, thread: ThreadId, category: &C, id: K) -> bool {
        self.threads
            .entry(thread)
            .or_default()
            .entry(category.clone())
            .or_default()
            .insert(id)
    }

    /// Forget that `thread` holds `id` in `category`.
    pub fn unbind(&mut self, thread: ThreadId, category: &C, id: &K) -> bool {
        let Some(categories) = self.threads.get_mut(&thread) else {
            return false;
        };
        let Some(ids) = categories.get_mut(category) else {
            return false;
        };

        let removed = ids.remove(id);
        if ids.is_empty() {
            categories.remove(category);
        }
        if categories.is_empty() {
            self.threads.remove(&thread);
        }
        removed
    }

    /// Remove and return every id `thread` holds in `category`.
    pub fn take(&mut self, thread: ThreadId, category: &C) -> HashSet<K> {
        let Some(categories) = self.threads.get_mut(&thread) else {
            return HashSet::new();
        };
        let taken = categories.remove(category).unwrap_or_default();
        if categories.is_empty() {
            self.threads.remove(&thread);
        }
        taken
    }

    /// Number of ids `thread` holds in `category`.
    pub fn count(&self, thread: ThreadId, category: &C) -> usize {
        self.threads
            .get(&thread)
            .and_then(|categories| categories.get(category))
            .map_or(0, HashSet::len)
    }

    /// Check if `thread` holds `id` in `category`.
    pub fn contains(&self, thread: ThreadId, category: &C, id: &K) -> bool {
        self.threads
            .get(&thread)
            .and_then(|categories| categories.get(category))
            .is_some_and(|ids| ids.contains(id))
    }

    /// Total ids held in `category` across all threads.
    pub fn category_total(&self, category: &C) -> usize {
        self.threads
            .values()
            .filter_map(|categories| categories.get(category))
            .map(HashSet::len)
            .sum()
    }

}

impl<K: LockKey, C: LockKey> Default for OwnershipIndex<K, C> {
    fn default() -> Self {
        Self::new()
    }
}
