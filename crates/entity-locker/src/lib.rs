//! # Entity Locker
//!
//! Row-level, in-process lock manager. Components coordinate exclusive access
//! to individually identified entities, a `(category, id)` pair, without each
//! building its own locking scheme and without serializing access to
//! unrelated entities. The locker never touches entity data.
//!
//! ## Locking Model
//!
//! | Lock | Scope | Reentrant | Released by |
//! |------|-------|-----------|-------------|
//! | Entity lock | one `(category, id)` | yes | owning thread only |
//! | Category lock | whole category | yes | owning thread only |
//!
//! A thread that already holds `escalation_threshold` entity locks in a
//! category, and is the only thread holding entities there, is escalated on
//! its next `lock`: its entity locks are released and it is granted the
//! category lock instead. It keeps that lock until `global_unlock`.
//!
//! ## Usage
//!
//! ```rust
//! use entity_locker::{EntityLocker, EntityLockerApi};
//! use std::time::Duration;
//!
//! let locker: EntityLocker<u64, &str> = EntityLocker::with_threshold(2).unwrap();
//!
//! assert!(locker.lock(&1, &"accounts").unwrap());
//! assert!(locker.try_lock_for(&2, &"accounts", Duration::from_millis(10)).unwrap());
//!
//! // Third entity in the category: escalated to the category lock
//! assert!(locker.lock(&3, &"accounts").unwrap());
//! assert!(locker.holds_global_lock(&"accounts"));
//!
//! locker.global_unlock(&"accounts").unwrap();
//! assert!(!locker.is_globally_locked(&"accounts"));
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! entity-locker/
//! ├── domain/          # Hold records, ownership index, errors, invariants
//! ├── algorithms/      # Escalation and global-lock eligibility
//! ├── ports/           # EntityLockerApi
//! ├── application/     # Lock table + EntityLocker service
//! └── config.rs        # LockerConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use algorithms::{global_lock_permitted, should_escalate};
pub use application::{EntityGrant, EntityLocker, GlobalGrant, LockTable};
pub use config::{LockerConfig, DEFAULT_ESCALATION_THRESHOLD, ESCALATION_THRESHOLD_ENV};
pub use domain::{
    invariant_global_exclusion, invariant_hold_owner, invariant_live_count, CategoryState,
    HoldError, HoldState, LockError, LockKey, LockResult, OwnershipIndex,
};
pub use ports::EntityLockerApi;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
