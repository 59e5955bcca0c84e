//! Inbound Ports (Driving Ports / API)
//!
//! The locking contract offered to components that arbitrate access to
//! entities. Locks are tied to the calling OS thread: the thread that
//! acquires a lock is the only one allowed to release it.

use crate::domain::errors::LockResult;
use std::time::Duration;

/// Primary Entity Locker API
///
/// `K` identifies an entity within a category, `C` identifies the category.
pub trait EntityLockerApi<K, C>: Send + Sync {
    /// Lock one entity, blocking until it is obtained.
    ///
    /// Reentrant for the calling thread. May be satisfied by escalation to the
    /// category lock instead of a dedicated entity lock.
    ///
    /// # Errors
    ///
    /// [`LockError::Cancelled`](crate::LockError::Cancelled) if the thread is
    /// interrupted first; nothing is left held.
    fn lock(&self, id: &K, category: &C) -> LockResult<bool>;

    /// Bounded variant of [`lock`](Self::lock).
    ///
    /// Returns `Ok(false)` once `timeout` elapses without acquisition.
    fn try_lock_for(&self, id: &K, category: &C, timeout: Duration) -> LockResult<bool>;

    /// Release one hold on an entity lock.
    ///
    /// Releasing an entity that has no lock at all is a no-op.
    ///
    /// # Errors
    ///
    /// [`LockError::NotOwner`](crate::LockError::NotOwner) if another thread
    /// holds the entity.
    fn unlock(&self, id: &K, category: &C) -> LockResult<()>;

    /// Lock a whole category, blocking until no other thread holds an entity
    /// in it.
    ///
    /// Reentrant: repeat calls add holds without waiting again.
    fn global_lock(&self, category: &C) -> LockResult<bool>;

    /// Bounded variant of [`global_lock`](Self::global_lock).
    fn try_global_lock_for(&self, category: &C, timeout: Duration) -> LockResult<bool>;

    /// Release one hold on a category lock.
    ///
    /// # Errors
    ///
    /// [`LockError::NotOwner`](crate::LockError::NotOwner) if another thread
    /// holds the category lock.
    fn global_unlock(&self, category: &C) -> LockResult<()>;
}
