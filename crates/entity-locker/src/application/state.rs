//! Lock table guarded by the bookkeeping mutex.
//!
//! Every method here runs with the bookkeeping mutex held and never blocks.
//! Waiting is done by the service, which parks on the category
//! wait-condition and retries the non-blocking step after every wake.

use crate::algorithms::{global_lock_permitted, should_escalate};
use crate::domain::{
    invariant_global_exclusion, invariant_hold_owner, invariant_live_count, CategoryState,
    HoldError, HoldState, LockKey, OwnershipIndex,
};
use parking_lot::Condvar;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

/// Outcome of a successful entity acquisition step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityGrant {
    /// A fresh entity lock was taken.
    Acquired,
    /// The caller already held the entity; one more hold was added.
    Reentered,
    /// The caller's entity locks were traded for the category lock.
    Escalated {
        /// Number of entity locks released by the escalation.
        released: usize,
    },
}

/// Outcome of a successful category acquisition step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalGrant {
    /// The category lock was taken.
    Acquired,
    /// The caller already held the category lock; one more hold was added.
    Reentered,
}

/// A thread that has used the locker.
///
/// `alive` dangles once the thread has exited; the record is then dropped
/// together with any interrupt still pending on it.
#[derive(Debug)]
struct ThreadRecord {
    alive: Weak<()>,
    interrupted: bool,
}

impl ThreadRecord {
    fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// Category registry, entity lock tables, ownership index and interrupt
/// flags.
#[derive(Debug)]
pub struct LockTable<K, C> {
    categories: HashMap<C, CategoryState<K>>,
    ownership: OwnershipIndex<K, C>,
    threads: HashMap<ThreadId, ThreadRecord>,
    parked: HashMap<ThreadId, Arc<Condvar>>,
}

impl<K: LockKey, C: LockKey> LockTable<K, C> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            categories: HashMap::new(),
            ownership: OwnershipIndex::new(),
            threads: HashMap::new(),
            parked: HashMap::new(),
        }
    }

    /// One non-blocking attempt at an entity lock.
    ///
    /// Takes the category intent-lock, decides on escalation and either keeps
    /// the intent hold as the caller's category lock or takes the entity lock
    /// and drops the intent hold. Returns `None` when the caller has to wait.
    pub fn try_lock_entity(
        &mut self,
        id: &K,
        category: &C,
        thread: ThreadId,
        threshold: usize,
    ) -> Option<EntityGrant> {
        let owned = self.ownership.count(thread, category);
        let state = self.categories.entry(category.clone()).or_default();

        if !state.lock.try_enter(thread) {
            return None;
        }

        if should_escalate(owned, state.live_entities, threshold) {
            let released = self.ownership.take(thread, category);
            for held in &released {
                state.entities.remove(held);
            }
            state.live_entities -= released.len();
            state.wake_all();
            return Some(EntityGrant::Escalated {
                released: released.len(),
            });
        }

        let grant = match state.entities.entry(id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(HoldState::held_by(thread));
                state.live_entities += 1;
                self.ownership.bind(thread, category, id.clone());
                Some(EntityGrant::Acquired)
            }
            Entry::Occupied(mut held) => held
                .get_mut()
                .try_enter(thread)
                .then_some(EntityGrant::Reentered),
        };

        // The intent hold was taken above, so releasing it cannot fail.
        let _ = state.lock.exit(thread);
        grant
    }

    /// One non-blocking attempt at a category lock.
    pub fn try_global_lock(&mut self, category: &C, thread: ThreadId) -> Option<GlobalGrant> {
        let owned = self.ownership.count(thread, category);
        let state = self.categories.entry(category.clone()).or_default();

        if state.lock.is_held_by(thread) {
            state.lock.try_enter(thread);
            return Some(GlobalGrant::Reentered);
        }
        if !state.lock.is_free() || !global_lock_permitted(state.live_entities, owned) {
            return None;
        }

        state.lock.try_enter(thread);
        Some(GlobalGrant::Acquired)
    }

    /// Release one hold on an entity lock.
    ///
    /// Returns `Ok(true)` when the entity became free.
    pub fn unlock_entity(&mut self, id: &K, category: &C, thread: ThreadId) -> Result<bool, HoldError> {
        let state = self.categories.get_mut(category).ok_or(HoldError::NotHeld)?;
        let hold = state.entities.get_mut(id).ok_or(HoldError::NotHeld)?;

        if !hold.exit(thread)? {
            return Ok(false);
        }

        state.entities.remove(id);
        state.live_entities -= 1;
        state.wake_all();
        self.ownership.unbind(thread, category, id);
        self.prune(category);
        Ok(true)
    }

    /// Release one hold on a category lock.
    ///
    /// Returns `Ok(true)` when the category lock became free.
    pub fn global_unlock(&mut self, category: &C, thread: ThreadId) -> Result<bool, HoldError> {
        let state = self.categories.get_mut(category).ok_or(HoldError::NotHeld)?;

        if !state.lock.exit(thread)? {
            return Ok(false);
        }

        state.wake_all();
        self.prune(category);
        Ok(true)
    }

    /// Register `thread` as waiting on the category wait-condition.
    pub fn park(&mut self, thread: ThreadId, category: &C) -> Arc<Condvar> {
        let state = self.categories.entry(category.clone()).or_default();
        state.waiters += 1;
        let signal = state.signal();
        self.parked.insert(thread, Arc::clone(&signal));
        signal
    }

    /// Undo [`park`](Self::park) after a wake or timeout.
    pub fn unpark(&mut self, thread: ThreadId, category: &C) {
        self.parked.remove(&thread);
        if let Some(state) = self.categories.get_mut(category) {
            state.waiters = state.waiters.saturating_sub(1);
        }
        self.prune(category);
    }

    /// Record `thread` as a user of the locker.
    ///
    /// `alive` must stop upgrading once the thread exits. Registering a new
    /// thread drops the records of exited ones.
    pub fn register(&mut self, thread: ThreadId, alive: Weak<()>) {
        if self.threads.contains_key(&thread) {
            return;
        }
        self.sweep_threads();
        self.threads.insert(
            thread,
            ThreadRecord {
                alive,
                interrupted: false,
            },
        );
    }

    /// Flag `thread` as interrupted and wake it if parked.
    ///
    /// Only registered threads that are still running can be interrupted.
    /// Returns `true` when the interrupt was recorded.
    pub fn interrupt(&mut self, thread: ThreadId) -> bool {
        self.sweep_threads();
        let Some(record) = self.threads.get_mut(&thread) else {
            return false;
        };

        record.interrupted = true;
        if let Some(signal) = self.parked.get(&thread) {
            signal.notify_all();
        }
        true
    }

    /// Consume a pending interrupt of `thread`.
    pub fn take_interrupt(&mut self, thread: ThreadId) -> bool {
        self.threads
            .get_mut(&thread)
            .is_some_and(|record| std::mem::take(&mut record.interrupted))
    }

    /// Check if `thread` is parked on a category wait-condition.
    pub fn is_parked(&self, thread: ThreadId) -> bool {
        self.parked.contains_key(&thread)
    }

    /// Drop the records of exited threads and count the rest.
    pub fn thread_count(&mut self) -> usize {
        self.sweep_threads();
        self.threads.len()
    }

    fn sweep_threads(&mut self) {
        self.threads.retain(|_, record| record.is_alive());
    }

    /// Drop the category record once nothing refers to it.
    pub fn prune(&mut self, category: &C) -> bool {
        let idle = self
            .categories
            .get(category)
            .is_some_and(CategoryState::is_idle);
        if idle {
            self.categories.remove(category);
        }
        idle
    }

    /// Category record, if one is kept.
    pub fn category(&self, category: &C) -> Option<&CategoryState<K>> {
        self.categories.get(category)
    }

    /// Number of entities `thread` holds in `category`.
    pub fn owned_count(&self, thread: ThreadId, category: &C) -> usize {
        self.ownership.count(thread, category)
    }

    /// Number of category records kept.
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Evaluate every domain invariant for `category`.
    pub fn is_consistent(&self, category: &C) -> bool {
        match self.categories.get(category) {
            Some(state) => {
                invariant_hold_owner(&state.lock)
                    && state.entities.values().all(invariant_hold_owner)
                    && invariant_live_count(category, state, &self.ownership)
                    && invariant_global_exclusion(state)
            }
            None => self.ownership.category_total(category) == 0,
        }
    }
}

impl<K: LockKey, C: LockKey> Default for LockTable<K, C> {
    fn default() -> Self {
        Self::new()
    }
}
