//! # Domain Module
//!
//! Lock records, the ownership index, errors and invariants.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod ownership;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use ownership::*;
