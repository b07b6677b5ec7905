//! User persistence.
//!
//! The core only needs lookup-by-id (refresh redemption, `/auth/user`),
//! lookup-by-username (login), creation (signup) and a directory listing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::auth::{User, UserSummary, UserWithPassword};

/// Durable user directory.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user and password hash by username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserWithPassword>, StoreError>;

    /// Fetch a user by ID.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError>;

    /// Create a new user. Fails with `StoreError::Duplicate` if the username is taken.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Every user except `exclude`, ordered by username.
    async fn list_except(&self, exclude: &Uuid) -> Result<Vec<UserSummary>, StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// `UserStore` backed by the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type UserRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, created_at, updated_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(
            |(id, username, password_hash, created_at, updated_at)| UserWithPassword {
                user: User {
                    id,
                    username,
                    created_at,
                    updated_at,
                },
                password_hash,
            },
        ))
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, created_at, updated_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_except(&self, exclude: &Uuid) -> Result<Vec<UserSummary>, StoreError> {
        let rows = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username FROM users WHERE id <> $1 ORDER BY username",
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local `UserStore` for tests and `--ephemeral` runs.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, UserWithPassword>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, UserWithPassword>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Unavailable("user store lock poisoned".into()))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithPassword>, StoreError> {
        let users = self.lock()?;
        Ok(users.values().find(|u| u.user.username == username).cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        let users = self.lock()?;
        Ok(users.get(id).map(|u| u.user.clone()))
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.lock()?;
        if users.values().any(|u| u.user.username == username) {
            return Err(StoreError::Duplicate("username".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(
            user.id,
            UserWithPassword {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(user)
    }

    async fn list_except(&self, exclude: &Uuid) -> Result<Vec<UserSummary>, StoreError> {
        let users = self.lock()?;
        let mut rows: Vec<UserSummary> = users
            .values()
            .filter(|u| &u.user.id != exclude)
            .map(|u| UserSummary {
                id: u.user.id,
                username: u.user.username.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(rows)
    }
}
