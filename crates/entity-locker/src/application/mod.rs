//! Application layer: the lock table and the service driving it.

pub mod service;
pub mod state;

pub use service::EntityLocker;
pub use state::{EntityGrant, GlobalGrant, LockTable};
