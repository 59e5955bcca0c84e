//! # Domain Invariants
//!
//! Bookkeeping rules that hold whenever the bookkeeping mutex is released.

use super::entities::{CategoryState, HoldState, LockKey};
use super::ownership::OwnershipIndex;

/// Invariant: a record has holds if and only if it has an owner.
pub fn invariant_hold_owner(hold: &HoldState) -> bool {
    (hold.holds() > 0) == hold.owner().is_some()
}

/// Invariant: the live count, the entity table and the ownership index agree.
///
/// Every entity record is held and appears in its owner's ownership set, and
/// no ownership set names an id without a record.
pub fn invariant_live_count<K: LockKey, C: LockKey>(
    category: &C,
    state: &CategoryState<K>,
    index: &OwnershipIndex<K, C>,
) -> bool {
    if state.live_entities != state.entities.len() {
        return false;
    }
    if index.category_total(category) != state.live_entities {
        return false;
    }
    state.entities.iter().all(|(id, hold)| match hold.owner() {
        Some(owner) => index.contains(owner, category, id),
        None => false,
    })
}

/// Invariant: while a thread holds the category lock, no other thread holds
/// an entity lock in that category.
pub fn invariant_global_exclusion<K: LockKey>(state: &CategoryState<K>) -> bool {
    match state.lock.owner() {
        Some(owner) => state
            .entities
            .values()
            .all(|hold| hold.is_held_by(owner)),
        None => true,
    }
}
