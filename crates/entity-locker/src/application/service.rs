//! Entity Locker Service
//!
//! Main service implementing `EntityLockerApi`.
//!
//! Lock acquisition order is bookkeeping mutex, then category lock, then
//! entity lock. The bookkeeping mutex is only held for non-blocking steps:
//! a thread that cannot proceed parks on the category wait-condition, which
//! releases the mutex, and re-evaluates its request after every wake.

use crate::application::state::{EntityGrant, GlobalGrant, LockTable};
use crate::config::LockerConfig;
use crate::domain::errors::{HoldError, LockError, LockResult};
use crate::domain::LockKey;
use crate::ports::inbound::EntityLockerApi;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

thread_local! {
    // Dropped when the thread exits, which invalidates every `Weak` handed out.
    static ALIVE: Arc<()> = Arc::new(());
}

/// Liveness handle of the calling thread.
fn liveness() -> Weak<()> {
    ALIVE.with(Arc::downgrade)
}

/// Row-level lock manager with category-wide escalation.
///
/// Share it between threads by reference or through an `Arc`; every lock it
/// hands out belongs to the calling thread.
pub struct EntityLocker<K, C> {
    config: LockerConfig,
    table: Mutex<LockTable<K, C>>,
}

impl<K: LockKey, C: LockKey> EntityLocker<K, C> {
    /// Create a locker with the default configuration.
    pub fn new() -> Self {
        Self {
            config: LockerConfig::default(),
            table: Mutex::new(LockTable::new()),
        }
    }

    /// Create a locker with a custom configuration.
    pub fn with_config(config: LockerConfig) -> LockResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: Mutex::new(LockTable::new()),
        })
    }

    /// Create a locker escalating after `threshold` entities per category.
    pub fn with_threshold(threshold: usize) -> LockResult<Self> {
        Self::with_config(LockerConfig::with_threshold(threshold))
    }

    /// Active configuration.
    pub fn config(&self) -> &LockerConfig {
        &self.config
    }

    /// Entities a thread may hold in one category before escalation.
    pub fn escalation_threshold(&self) -> usize {
        self.config.escalation_threshold
    }

    /// Interrupt `thread`.
    ///
    /// If the thread is parked in a lock call, that call returns
    /// [`LockError::Cancelled`]. Otherwise the interrupt stays pending and
    /// cancels the thread's next blocking call.
    ///
    /// Only threads that have called into this locker (the caller included)
    /// and are still running can be interrupted; the call is ignored for any
    /// other thread. A pending interrupt is discarded when its thread exits.
    pub fn interrupt(&self, thread: ThreadId) {
        let mut table = self.table.lock();
        table.register(thread::current().id(), liveness());

        if table.interrupt(thread) {
            let parked = table.is_parked(thread);
            debug!(?thread, parked, "Thread interrupted");
        } else {
            debug!(?thread, "Ignoring interrupt of unknown or exited thread");
        }
    }

    /// Consume a pending interrupt of the calling thread.
    pub fn clear_interrupt(&self) -> bool {
        self.table.lock().take_interrupt(thread::current().id())
    }

    /// Number of running threads the locker keeps interrupt state for.
    pub fn tracked_threads(&self) -> usize {
        self.table.lock().thread_count()
    }

    /// Check if any thread holds the category lock.
    pub fn is_globally_locked(&self, category: &C) -> bool {
        self.table
            .lock()
            .category(category)
            .is_some_and(|state| !state.lock.is_free())
    }

    /// Check if the calling thread holds the category lock, either from
    /// `global_lock` or through escalation.
    pub fn holds_global_lock(&self, category: &C) -> bool {
        self.global_hold_count(category) > 0
    }

    /// Holds the calling thread has on the category lock.
    pub fn global_hold_count(&self, category: &C) -> u32 {
        let thread = thread::current().id();
        self.table
            .lock()
            .category(category)
            .filter(|state| state.lock.is_held_by(thread))
            .map_or(0, |state| state.lock.holds())
    }

    /// Number of entity locks currently held in `category`, by any thread.
    pub fn locked_entity_count(&self, category: &C) -> usize {
        self.table
            .lock()
            .category(category)
            .map_or(0, |state| state.live_entities)
    }

    /// Check if some thread holds the entity lock.
    pub fn is_entity_locked(&self, id: &K, category: &C) -> bool {
        self.table
            .lock()
            .category(category)
            .is_some_and(|state| state.entities.contains_key(id))
    }

    /// Number of entity locks the calling thread holds in `category`.
    pub fn owned_entity_count(&self, category: &C) -> usize {
        self.table
            .lock()
            .owned_count(thread::current().id(), category)
    }

    /// Number of category records currently kept.
    pub fn tracked_categories(&self) -> usize {
        self.table.lock().category_count()
    }

    fn lock_entity(&self, id: &K, category: &C, deadline: Option<Instant>) -> LockResult<bool> {
        let threshold = self.config.escalation_threshold;
        let grant = self.wait_for(category, deadline, |table, thread| {
            table.try_lock_entity(id, category, thread, threshold)
        })?;

        match grant {
            Some(EntityGrant::Acquired) => {
                debug!(entity = ?id, category = ?category, "Entity lock acquired");
            }
            Some(EntityGrant::Reentered) => {
                debug!(entity = ?id, category = ?category, "Entity lock re-entered");
            }
            Some(EntityGrant::Escalated { released }) => {
                info!(
                    entity = ?id,
                    category = ?category,
                    released,
                    threshold,
                    "Escalated entity locks to category lock"
                );
            }
            None => {
                debug!(entity = ?id, category = ?category, "Entity lock timed out");
            }
        }
        Ok(grant.is_some())
    }

    fn lock_category(&self, category: &C, deadline: Option<Instant>) -> LockResult<bool> {
        let grant = self.wait_for(category, deadline, |table, thread| {
            table.try_global_lock(category, thread)
        })?;

        match grant {
            Some(GlobalGrant::Acquired) => {
                debug!(category = ?category, "Category lock acquired");
            }
            Some(GlobalGrant::Reentered) => {
                debug!(category = ?category, "Category lock re-entered");
            }
            None => {
                debug!(category = ?category, "Category lock timed out");
            }
        }
        Ok(grant.is_some())
    }

    /// Retry `attempt` under the bookkeeping mutex until it succeeds, the
    /// deadline passes or the thread is interrupted.
    ///
    /// A failed attempt leaves nothing held, so timeouts and cancellation
    /// need no rollback.
    fn wait_for<T>(
        &self,
        category: &C,
        deadline: Option<Instant>,
        mut attempt: impl FnMut(&mut LockTable<K, C>, ThreadId) -> Option<T>,
    ) -> LockResult<Option<T>> {
        let thread = thread::current().id();
        let mut table = self.table.lock();
        table.register(thread, liveness());

        if table.take_interrupt(thread) {
            warn!(category = ?category, "Lock request cancelled by pending interrupt");
            return Err(LockError::Cancelled);
        }

        loop {
            if let Some(granted) = attempt(&mut *table, thread) {
                debug_assert!(table.is_consistent(category));
                return Ok(Some(granted));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(None);
            }

            trace!(category = ?category, "Parking on category wait-condition");
            let signal = table.park(thread, category);
            match deadline {
                Some(deadline) => {
                    signal.wait_until(&mut table, deadline);
                }
                None => signal.wait(&mut table),
            }
            table.unpark(thread, category);

            if table.take_interrupt(thread) {
                warn!(category = ?category, "Lock request cancelled while waiting");
                return Err(LockError::Cancelled);
            }
        }
    }
}

impl<K: LockKey, C: LockKey> Default for EntityLocker<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> EntityLockerApi<K, C> for EntityLocker<K, C>
where
    K: LockKey + Send,
    C: LockKey + Send,
{
    fn lock(&self, id: &K, category: &C) -> LockResult<bool> {
        self.lock_entity(id, category, None)
    }

    fn try_lock_for(&self, id: &K, category: &C, timeout: Duration) -> LockResult<bool> {
        self.lock_entity(id, category, deadline_after(timeout))
    }

    fn unlock(&self, id: &K, category: &C) -> LockResult<()> {
        let thread = thread::current().id();
        let outcome = {
            let mut table = self.table.lock();
            let outcome = table.unlock_entity(id, category, thread);
            debug_assert!(table.is_consistent(category));
            outcome
        };

        match outcome {
            Ok(true) => {
                debug!(entity = ?id, category = ?category, "Entity lock released");
                Ok(())
            }
            Ok(false) => {
                debug!(entity = ?id, category = ?category, "Entity hold released, lock still held");
                Ok(())
            }
            Err(HoldError::NotHeld) => {
                debug!(entity = ?id, category = ?category, "Ignoring unlock of entity without lock");
                Ok(())
            }
            Err(HoldError::NotOwner) => {
                warn!(entity = ?id, category = ?category, "Entity unlock by non-owner rejected");
                Err(LockError::entity_not_owned(id, category))
            }
        }
    }

    fn global_lock(&self, category: &C) -> LockResult<bool> {
        self.lock_category(category, None)
    }

    fn try_global_lock_for(&self, category: &C, timeout: Duration) -> LockResult<bool> {
        self.lock_category(category, deadline_after(timeout))
    }

    fn global_unlock(&self, category: &C) -> LockResult<()> {
        let thread = thread::current().id();
        let outcome = self.table.lock().global_unlock(category, thread);

        match outcome {
            Ok(true) => {
                debug!(category = ?category, "Category lock released");
                Ok(())
            }
            Ok(false) => {
                debug!(category = ?category, "Category hold released, lock still held");
                Ok(())
            }
            Err(HoldError::NotHeld) => {
                debug!(category = ?category, "Ignoring unlock of category without lock");
                Ok(())
            }
            Err(HoldError::NotOwner) => {
                warn!(category = ?category, "Category unlock by non-owner rejected");
                Err(LockError::category_not_owned(category))
            }
        }
    }
}

/// Deadline for a bounded wait; `None` if it cannot be represented.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}
