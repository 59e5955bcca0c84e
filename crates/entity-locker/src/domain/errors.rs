//! # Domain Errors
//!
//! Error taxonomy for the entity locker.
//!
//! A timeout is not an error: bounded operations report it as `Ok(false)`.

use thiserror::Error;

/// Result alias used across the crate.
pub type LockResult<T> = Result<T, LockError>;

/// Entity locker error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Rejected argument or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Release attempted by a thread that does not hold the lock.
    #[error("Ownership violation: current thread does not hold {resource}")]
    NotOwner {
        /// Description of the lock the caller tried to release.
        resource: String,
    },

    /// The calling thread was interrupted while acquiring a lock.
    #[error("Lock acquisition cancelled by interrupt")]
    Cancelled,
}

impl LockError {
    /// Ownership violation on an entity lock.
    pub fn entity_not_owned<K: std::fmt::Debug, C: std::fmt::Debug>(id: &K, category: &C) -> Self {
        Self::NotOwner {
            resource: format!("entity lock {:?} in category {:?}", id, category),
        }
    }

    /// Ownership violation on a category lock.
    pub fn category_not_owned<C: std::fmt::Debug>(category: &C) -> Self {
        Self::NotOwner {
            resource: format!("category lock {:?}", category),
        }
    }

    /// Check if this error is the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure releasing a reentrant hold record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HoldError {
    /// Nobody holds the record.
    #[error("lock is not held")]
    NotHeld,

    /// Another thread holds the record.
    #[error("lock is held by another thread")]
    NotOwner,
}
