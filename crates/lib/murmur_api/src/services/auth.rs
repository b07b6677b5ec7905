//! Account service — signup, login and token refresh.
//!
//! Tokens are stateless: nothing about a session is written to the store.

use chrono::Utc;
use murmur_core::auth::password::{hash_password, verify_password};
use murmur_core::auth::{AuthError, TokenCodec};
use murmur_core::error::StoreError;
use murmur_core::models::auth::{IdentityClaim, TokenKind, User, UserSummary};
use murmur_core::session::SessionAuthenticator;
use murmur_core::users::UserStore;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AccessTokenPayload, AuthPayload};

/// Minimum password length.
const MIN_PASSWORD_LEN: usize = 6;

/// Allowed username length range (characters, after trimming).
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=30;

/// Mint an access + refresh pair for `user`.
fn issue_pair(codec: &TokenCodec, user: User) -> AppResult<AuthPayload> {
    let claim = IdentityClaim::from(&user);
    let now = Utc::now();
    let access_token = codec.issue(&claim, TokenKind::Access, now)?;
    let refresh_token = codec.issue(&claim, TokenKind::Refresh, now)?;
    Ok(AuthPayload {
        user,
        access_token,
        refresh_token,
    })
}

fn require_credentials<'a>(username: &'a str, password: &'a str) -> AppResult<(&'a str, &'a str)> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".into(),
        ));
    }
    Ok((username, password))
}

/// Register a new account and sign it in.
pub async fn signup(
    users: &dyn UserStore,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> AppResult<AuthPayload> {
    let (username, password) = require_credentials(username, password)?;

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::Validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }

    if users.find_by_username(username).await?.is_some() {
        return Err(AuthError::DuplicateUsername.into());
    }

    let pw_hash = hash_password(password)?;
    let user = users
        .create(username, &pw_hash)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent signup for the same name.
            StoreError::Duplicate(_) => AuthError::DuplicateUsername,
            other => AuthError::Store(other),
        })?;

    info!(username, user_id = %user.id, "user signed up");
    issue_pair(codec, user)
}

/// Authenticate with username + password.
///
/// Unknown usernames and wrong passwords fail identically.
pub async fn login(
    users: &dyn UserStore,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> AppResult<AuthPayload> {
    let (username, password) = require_credentials(username, password)?;

    let Some(found) = users.find_by_username(username).await? else {
        return Err(AuthError::CredentialError.into());
    };
    if !verify_password(password, &found.password_hash)? {
        return Err(AuthError::CredentialError.into());
    }

    info!(username, "user logged in");
    issue_pair(codec, found.user)
}

/// Exchange a refresh token for a new access token.
pub async fn refresh(
    users: &dyn UserStore,
    sessions: &SessionAuthenticator,
    refresh_token: Option<&str>,
) -> AppResult<AccessTokenPayload> {
    let token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Refresh token is required".into()))?;

    let claim = sessions.authenticate_refresh(token)?;
    let user = find_user(users, &claim).await?;

    let access_token = sessions
        .codec()
        .issue(&IdentityClaim::from(&user), TokenKind::Access, Utc::now())?;
    Ok(AccessTokenPayload { access_token })
}

/// Resolve the claim's user, failing with `NotFound` if it no longer exists.
pub async fn find_user(users: &dyn UserStore, claim: &IdentityClaim) -> AppResult<User> {
    let id = Uuid::parse_str(&claim.id).map_err(|_| AuthError::Unauthorized)?;
    let user = users
        .find_by_id(&id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    Ok(user)
}

/// Everyone except the requester, for picking a conversation partner.
pub async fn list_other_users(
    users: &dyn UserStore,
    requester: &Uuid,
) -> AppResult<Vec<UserSummary>> {
    Ok(users.list_except(requester).await?)
}
