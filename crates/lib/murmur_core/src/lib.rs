//! # murmur_core
//!
//! Core domain logic for Murmur: tokens, sessions, message storage,
//! presence and delivery.

pub mod auth;
pub mod delivery;
pub mod error;
pub mod history;
pub mod messages;
pub mod migrate;
pub mod models;
pub mod presence;
pub mod session;
pub mod users;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
