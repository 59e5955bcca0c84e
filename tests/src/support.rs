//! Shared fixtures for the integration scenarios.

use entity_locker::{EntityLocker, EntityLockerApi};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Locker type used throughout the suite.
pub type TestLocker = EntityLocker<String, &'static str>;

/// Upper bound for "this should happen promptly" waits.
pub const PROMPT: Duration = Duration::from_secs(2);

/// Short wait used to observe that something is still blocked.
pub const BRIEF: Duration = Duration::from_millis(100);

/// Install a test-friendly subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .with_target(true)
        .with_thread_ids(true);

    // Already installed by an earlier test
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Shared locker with the given escalation threshold.
pub fn locker_with_threshold(threshold: usize) -> Arc<TestLocker> {
    init_tracing();
    Arc::new(TestLocker::with_threshold(threshold).expect("positive threshold"))
}

/// Shared locker with the default configuration.
pub fn default_locker() -> Arc<TestLocker> {
    init_tracing();
    Arc::new(TestLocker::new())
}

/// A background thread holding one entity lock until released.
pub struct HeldEntity {
    release: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl HeldEntity {
    /// Lock `id` on a new thread and return once it is held.
    pub fn spawn(locker: &Arc<TestLocker>, id: &str, category: &'static str) -> Self {
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release, release_rx) = mpsc::channel::<()>();
        let locker = Arc::clone(locker);
        let id = id.to_string();

        let handle = thread::spawn(move || {
            assert!(locker.lock(&id, &category).expect("lock"));
            debug!(entity = %id, category, "Background holder locked entity");
            locked_tx.send(()).expect("signal locked");
            let _ = release_rx.recv();
            locker.unlock(&id, &category).expect("unlock by owner");
        });

        locked_rx.recv_timeout(PROMPT).expect("entity locked in time");
        Self { release, handle }
    }

    /// Unlock on the holder thread and wait for it to finish.
    pub fn release(self) {
        let _ = self.release.send(());
        self.handle.join().expect("holder thread panicked");
    }
}

/// A background thread holding one category lock until released.
pub struct HeldCategory {
    release: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl HeldCategory {
    /// Take the category lock on a new thread and return once it is held.
    pub fn spawn(locker: &Arc<TestLocker>, category: &'static str) -> Self {
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release, release_rx) = mpsc::channel::<()>();
        let locker = Arc::clone(locker);

        let handle = thread::spawn(move || {
            assert!(locker.global_lock(&category).expect("global lock"));
            debug!(category, "Background holder locked category");
            locked_tx.send(()).expect("signal locked");
            let _ = release_rx.recv();
            locker.global_unlock(&category).expect("global unlock by owner");
        });

        locked_rx.recv_timeout(PROMPT).expect("category locked in time");
        Self { release, handle }
    }

    /// Unlock on the holder thread and wait for it to finish.
    pub fn release(self) {
        let _ = self.release.send(());
        self.handle.join().expect("holder thread panicked");
    }
}
