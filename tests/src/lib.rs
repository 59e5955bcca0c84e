//! # Entity Locker Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Tracing setup and thread helpers
//! └── integration/      # Multi-threaded locking scenarios
//!     ├── mutual_exclusion.rs
//!     ├── global_lock.rs
//!     ├── escalation.rs
//!     ├── timeouts.rs
//!     ├── cancellation.rs
//!     └── stress.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p entity-locker-tests
//!
//! # By scenario, with lock tracing
//! RUST_LOG=entity_locker=debug cargo test -p entity-locker-tests integration::escalation::
//!
//! # Benchmarks
//! cargo bench -p entity-locker-tests
//! ```

pub mod support;
