//! Request and response bodies.
//!
//! Every response uses the same envelope: `{"status": "success", "data": …}`
//! or `{"status": "error", "error": <code>, "message": <text>}`.

use axum::Json;
use murmur_core::models::auth::User;
use serde::{Deserialize, Serialize};

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success".into(),
            data,
        })
    }
}

/// Error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            status: "error".into(),
            error: error.into(),
            message: message.into(),
        }
    }
}

/// `POST /auth/signup` and `POST /auth/login` body.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /auth/refresh-token` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Issued token pair plus the account it belongs to.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Fresh access token minted from a refresh token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenPayload {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPayload {
    pub user: User,
}

/// `GET /messages` query string.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, rename = "channelId", alias = "channel")]
    pub channel_id: Option<String>,
    #[serde(default, alias = "lastMessage")]
    pub cursor: Option<String>,
}
