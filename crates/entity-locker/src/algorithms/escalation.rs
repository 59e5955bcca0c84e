//! # Escalation Decisions
//!
//! Pure predicates evaluated under the bookkeeping mutex while the requesting
//! thread holds the category intent-lock.

/// Global-lock eligibility.
///
/// The category lock may be granted when no entity in the category is held,
/// or when every held entity belongs to the requester.
pub fn global_lock_permitted(live_entities: usize, owned_by_requester: usize) -> bool {
    live_entities == 0 || live_entities == owned_by_requester
}

/// Escalation decision for an entity `lock` request.
///
/// Fires when the requester already holds at least `threshold` entities in
/// the category and no other thread holds any.
pub fn should_escalate(owned_by_requester: usize, live_entities: usize, threshold: usize) -> bool {
    owned_by_requester >= threshold && global_lock_permitted(live_entities, owned_by_requester)
}
