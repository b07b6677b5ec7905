//! Authentication middleware — raw token extraction and JWT verification.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use murmur_core::models::auth::IdentityClaim;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;

/// Verified identity stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub IdentityClaim);

impl AuthenticatedUser {
    /// The claim's user id as a UUID.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.id)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
    }
}

/// The raw `Authorization` header value, if present and valid UTF-8.
///
/// The whole value is the credential; no scheme is expected or stripped.
pub fn raw_credential(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Axum middleware: verifies the `Authorization` header as an access token
/// and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claim = state
        .sessions
        .authenticate_request(raw_credential(request.headers()))?;

    request.extensions_mut().insert(AuthenticatedUser(claim));

    Ok(next.run(request).await)
}
