//! Request handlers.

pub mod auth;
pub mod messages;
pub mod ws;
