//! # Mutual Exclusion Scenarios
//!
//! Per-entity exclusion, reentrancy and ownership across threads.

#[cfg(test)]
mod tests {
    use crate::support::{default_locker, HeldEntity, BRIEF, PROMPT};
    use entity_locker::{EntityLockerApi, LockError};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;

    const ORDERS: &str = "orders";

    fn id(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn test_lock_unlock_then_other_thread_locks_immediately() {
        let locker = default_locker();

        assert!(locker.lock(&id("order-1"), &ORDERS).unwrap());
        locker.unlock(&id("order-1"), &ORDERS).unwrap();

        let other = Arc::clone(&locker);
        let acquired = thread::spawn(move || {
            let acquired = other.try_lock_for(&id("order-1"), &ORDERS, BRIEF).unwrap();
            other.unlock(&id("order-1"), &ORDERS).unwrap();
            acquired
        })
        .join()
        .unwrap();

        assert!(acquired);
        assert_eq!(locker.locked_entity_count(&ORDERS), 0);
    }

    #[test]
    fn test_reentrant_holds_need_matching_unlocks() {
        let locker = default_locker();
        let depth = 5;

        for _ in 0..depth {
            assert!(locker.lock(&id("order-1"), &ORDERS).unwrap());
        }

        let probe = |locker: &Arc<crate::support::TestLocker>| {
            let other = Arc::clone(locker);
            thread::spawn(move || {
                let acquired = other.try_lock_for(&id("order-1"), &ORDERS, BRIEF).unwrap();
                if acquired {
                    other.unlock(&id("order-1"), &ORDERS).unwrap();
                }
                acquired
            })
            .join()
            .unwrap()
        };

        for _ in 0..depth - 1 {
            locker.unlock(&id("order-1"), &ORDERS).unwrap();
            assert!(!probe(&locker));
        }

        locker.unlock(&id("order-1"), &ORDERS).unwrap();
        assert!(probe(&locker));
    }

    #[test]
    fn test_second_thread_waits_for_first_unlock() {
        let locker = default_locker();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let first = {
            let locker = Arc::clone(&locker);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                locker.lock(&id("order-1"), &ORDERS).unwrap();
                locked_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                log.lock().push("first");
                locker.unlock(&id("order-1"), &ORDERS).unwrap();
            })
        };
        locked_rx.recv_timeout(PROMPT).unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let second = {
            let locker = Arc::clone(&locker);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                locker.lock(&id("order-1"), &ORDERS).unwrap();
                log.lock().push("second");
                locker.unlock(&id("order-1"), &ORDERS).unwrap();
                done_tx.send(()).unwrap();
            })
        };

        // Second thread stays blocked while the first holds the entity
        assert!(done_rx.recv_timeout(BRIEF).is_err());
        assert!(locker.is_entity_locked(&id("order-1"), &ORDERS));

        release_tx.send(()).unwrap();
        done_rx.recv_timeout(PROMPT).unwrap();
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(*log.lock(), vec!["first", "second"]);
        assert_eq!(locker.tracked_categories(), 0);
    }

    #[test]
    fn test_only_one_thread_inside_at_a_time() {
        let locker = default_locker();
        let threads = 10;
        let rounds = 50;
        let inside = Arc::new(AtomicBool::new(false));
        let entered = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let locker = Arc::clone(&locker);
                let inside = Arc::clone(&inside);
                let entered = Arc::clone(&entered);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..rounds {
                        assert!(locker.lock(&id("hot"), &ORDERS).unwrap());
                        assert!(!inside.swap(true, Ordering::SeqCst), "two holders at once");
                        entered.fetch_add(1, Ordering::SeqCst);
                        inside.store(false, Ordering::SeqCst);
                        locker.unlock(&id("hot"), &ORDERS).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(entered.load(Ordering::SeqCst), threads * rounds);
        assert_eq!(locker.locked_entity_count(&ORDERS), 0);
        assert_eq!(locker.tracked_categories(), 0);
    }

    #[test]
    fn test_unrelated_entities_do_not_block() {
        let locker = default_locker();
        let held = HeldEntity::spawn(&locker, "order-1", ORDERS);

        assert!(locker.try_lock_for(&id("order-2"), &ORDERS, BRIEF).unwrap());
        assert_eq!(locker.locked_entity_count(&ORDERS), 2);
        locker.unlock(&id("order-2"), &ORDERS).unwrap();

        held.release();
        assert_eq!(locker.locked_entity_count(&ORDERS), 0);
    }

    #[test]
    fn test_unlock_by_thread_that_never_held_fails() {
        let locker = default_locker();
        let held = HeldEntity::spawn(&locker, "order-1", ORDERS);

        let other = Arc::clone(&locker);
        let result = thread::spawn(move || other.unlock(&id("order-1"), &ORDERS))
            .join()
            .unwrap();

        assert!(matches!(result, Err(LockError::NotOwner { .. })));
        assert!(locker.is_entity_locked(&id("order-1"), &ORDERS));

        held.release();
        assert!(!locker.is_entity_locked(&id("order-1"), &ORDERS));
    }

    #[test]
    fn test_ownership_violation_leaves_other_locks_intact() {
        let locker = default_locker();
        let held = HeldEntity::spawn(&locker, "order-1", ORDERS);
        locker.lock(&id("order-2"), &ORDERS).unwrap();

        assert!(locker.unlock(&id("order-1"), &ORDERS).is_err());
        assert_eq!(locker.locked_entity_count(&ORDERS), 2);
        assert_eq!(locker.owned_entity_count(&ORDERS), 1);

        locker.unlock(&id("order-2"), &ORDERS).unwrap();
        held.release();
    }
}
