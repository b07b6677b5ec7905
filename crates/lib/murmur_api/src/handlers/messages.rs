//! Message history and directory handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use murmur_core::models::auth::UserSummary;
use murmur_core::models::message::WireMessage;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, HistoryQuery};
use crate::services::auth;

/// `GET /messages?channelId=<user>&cursor=<message id>` — one page of
/// conversation history, oldest first.
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<WireMessage>>>> {
    let Query(query) = query?;
    let requester = user.user_id()?;
    let page = state
        .history
        .list(
            &requester,
            query.channel_id.as_deref(),
            query.cursor.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success(page))
}

/// `GET /messages/users` — everyone the requester can talk to.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let requester = user.user_id()?;
    let users = auth::list_other_users(state.users.as_ref(), &requester).await?;
    Ok(ApiResponse::success(users))
}
