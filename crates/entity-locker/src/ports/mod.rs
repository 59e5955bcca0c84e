//! Ports module for the entity locker

pub mod inbound;

pub use inbound::EntityLockerApi;
