//! # Algorithms Module
//!
//! Escalation and global-lock eligibility decisions.

pub mod escalation;

pub use escalation::{global_lock_permitted, should_escalate};
