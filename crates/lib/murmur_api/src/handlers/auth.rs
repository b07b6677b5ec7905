//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AccessTokenPayload, ApiResponse, AuthPayload, CredentialsRequest, RefreshRequest, UserPayload,
};
use crate::services::auth;

/// `POST /auth/signup` — create an account and return a token pair.
pub async fn signup_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let Json(body) = body?;
    let resp = auth::signup(
        state.users.as_ref(),
        state.sessions.codec(),
        &body.username,
        &body.password,
    )
    .await?;
    Ok((StatusCode::CREATED, ApiResponse::success(resp)))
}

/// `POST /auth/login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    let Json(body) = body?;
    let resp = auth::login(
        state.users.as_ref(),
        state.sessions.codec(),
        &body.username,
        &body.password,
    )
    .await?;
    Ok(ApiResponse::success(resp))
}

/// `POST /auth/refresh-token` — exchange a refresh token for an access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<AccessTokenPayload>>> {
    let Json(body) = body?;
    let resp = auth::refresh(
        state.users.as_ref(),
        &state.sessions,
        body.refresh_token.as_deref(),
    )
    .await?;
    Ok(ApiResponse::success(resp))
}

/// `GET /auth/user` — the authenticated account.
pub async fn current_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claim)): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse<UserPayload>>> {
    let user = auth::find_user(state.users.as_ref(), &claim).await?;
    Ok(ApiResponse::success(UserPayload { user }))
}
