//! Authentication and authorization logic.
//!
//! Provides password hashing and the stateless JWT codec shared by the HTTP
//! request path and the WebSocket upgrade path.

pub mod jwt;
pub mod password;

use thiserror::Error;

use crate::error::StoreError;

pub use jwt::{TokenCodec, TokenError, TokenTtls};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, invalid, expired or wrong-kind credential.
    #[error("Invalid or expired token")]
    Unauthorized,

    /// Login failed. Deliberately silent about which half was wrong.
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
