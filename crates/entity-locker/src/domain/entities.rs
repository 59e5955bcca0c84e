//! # Domain Entities
//!
//! Lock records kept by the locker. Records never block on their own; all of
//! them are mutated under the bookkeeping mutex and waiting happens on the
//! category wait-condition.

use super::errors::HoldError;
use parking_lot::Condvar;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::ThreadId;

/// Bound shared by entity identifiers and category discriminators.
pub trait LockKey: Eq + Hash + Clone + Debug {}

impl<T: Eq + Hash + Clone + Debug> LockKey for T {}

/// Reentrant exclusive hold record.
///
/// `holds > 0` if and only if `owner` is set. Only the owner may bring the
/// count back to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoldState {
    owner: Option<ThreadId>,
    holds: u32,
}

impl HoldState {
    /// Create a free record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record already held once by `thread`.
    pub fn held_by(thread: ThreadId) -> Self {
        Self {
            owner: Some(thread),
            holds: 1,
        }
    }

    /// Current owner, if any.
    pub fn owner(&self) -> Option<ThreadId> {
        self.owner
    }

    /// Number of outstanding holds.
    pub fn holds(&self) -> u32 {
        self.holds
    }

    /// Check if nobody holds the record.
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// Check if `thread` holds the record.
    pub fn is_held_by(&self, thread: ThreadId) -> bool {
        self.owner == Some(thread)
    }

    /// Take one hold for `thread` without blocking.
    ///
    /// Succeeds when the record is free or already owned by `thread`.
    pub fn try_enter(&mut self, thread: ThreadId) -> bool {
        match self.owner {
            None => {
                self.owner = Some(thread);
                self.holds = 1;
                true
            }
            Some(owner) if owner == thread => {
                self.holds += 1;
                true
            }
            Some(_) => false,
        }
    }

    /// Release one hold taken by `thread`.
    ///
    /// Returns `Ok(true)` when this was the last hold.
    pub fn exit(&mut self, thread: ThreadId) -> Result<bool, HoldError> {
        match self.owner {
            Some(owner) if owner == thread => {
                self.holds -= 1;
                if self.holds == 0 {
                    self.owner = None;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Some(_) => Err(HoldError::NotOwner),
            None => Err(HoldError::NotHeld),
        }
    }
}

/// Per-category record: the category lock, its wait-condition and the entity
/// lock table of the category.
#[derive(Debug)]
pub struct CategoryState<K> {
    /// Category-wide lock (intent holds and global holds).
    pub lock: HoldState,
    /// Entity locks currently held, keyed by entity id.
    pub entities: HashMap<K, HoldState>,
    /// Number of held entity locks in this category.
    pub live_entities: usize,
    /// Threads currently parked on `signal`.
    pub waiters: usize,
    signal: Arc<Condvar>,
}

impl<K: LockKey> CategoryState<K> {
    /// Create an empty category record.
    pub fn new() -> Self {
        Self {
            lock: HoldState::new(),
            entities: HashMap::new(),
            live_entities: 0,
            waiters: 0,
            signal: Arc::new(Condvar::new()),
        }
    }

    /// Handle on the category wait-condition.
    pub fn signal(&self) -> Arc<Condvar> {
        Arc::clone(&self.signal)
    }

    /// Wake every thread parked on this category.
    pub fn wake_all(&self) -> usize {
        self.signal.notify_all()
    }

    /// Check if the record carries no state worth keeping.
    pub fn is_idle(&self) -> bool {
        self.lock.is_free() && self.entities.is_empty() && self.live_entities == 0 && self.waiters == 0
    }
}

impl<K: LockKey> Default for CategoryState<K> {
    fn default() -> Self {
        Self::new()
    }
}
