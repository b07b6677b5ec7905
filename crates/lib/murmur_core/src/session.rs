//! Session authentication for the request and connection paths.
//!
//! The credential is the complete raw header value. No scheme prefix is
//! parsed or stripped, so `"Bearer <jwt>"` is rejected like any other
//! malformed token. Missing and invalid credentials are indistinguishable
//! to the caller.

use chrono::Utc;
use tracing::debug;

use crate::auth::{AuthError, TokenCodec};
use crate::models::auth::{IdentityClaim, TokenKind};

/// Verifies inbound credentials against the shared token codec.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    codec: TokenCodec,
}

impl SessionAuthenticator {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate a synchronous request from its raw credential header.
    pub fn authenticate_request(&self, raw: Option<&str>) -> Result<IdentityClaim, AuthError> {
        self.verify(raw, TokenKind::Access, "request")
    }

    /// Authenticate a connection upgrade before the connection is admitted.
    pub fn authenticate_connection(&self, raw: Option<&str>) -> Result<IdentityClaim, AuthError> {
        self.verify(raw, TokenKind::Access, "connection")
    }

    /// Validate a refresh token presented for redemption.
    pub fn authenticate_refresh(&self, raw: &str) -> Result<IdentityClaim, AuthError> {
        self.verify(Some(raw), TokenKind::Refresh, "refresh")
    }

    fn verify(
        &self,
        raw: Option<&str>,
        kind: TokenKind,
        path: &'static str,
    ) -> Result<IdentityClaim, AuthError> {
        let Some(token) = raw.filter(|t| !t.is_empty()) else {
            debug!(path, "missing credential");
            return Err(AuthError::Unauthorized);
        };
        self.codec.verify(token, kind, Utc::now()).map_err(|e| {
            debug!(path, reason = %e, "credential rejected");
            AuthError::Unauthorized
        })
    }
}
