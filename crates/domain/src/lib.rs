//! Shared types for the hub crates: configuration, identity, errors and
//! structured trace events.

pub mod config;
pub mod error;
pub mod identity;
pub mod trace;

pub use identity::{AccessLevel, Identity};
