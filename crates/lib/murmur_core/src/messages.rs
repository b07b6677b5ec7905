//! Message persistence.
//!
//! An append-only log of direct messages with a single read path: the latest
//! `limit` messages of a conversation strictly older than a cursor.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::message::{MessageRecord, NewMessage};
use crate::users::UserStore;
use crate::uuid::uuidv7_after;

/// Durable ordered message log.
///
/// Ids must increase strictly with append order within a process; they are
/// the pagination cursor.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its id and timestamps.
    ///
    /// Fails with `StoreError::MissingReference` when either party is not a
    /// known user.
    async fn append(&self, message: NewMessage) -> Result<MessageRecord, StoreError>;

    /// Up to `limit` messages exchanged between `a` and `b` (either
    /// direction) with `id < before` when a cursor is given.
    ///
    /// The newest matching messages are selected and returned oldest first.
    async fn query_conversation(
        &self,
        a: &Uuid,
        b: &Uuid,
        before: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, StoreError>;
}

/// Monotonic id source shared by both store implementations.
#[derive(Default)]
struct IdSequence {
    last: Mutex<Option<Uuid>>,
}

impl IdSequence {
    fn next(&self) -> Result<Uuid, StoreError> {
        let mut last = self
            .last
            .lock()
            .map_err(|_| StoreError::Unavailable("id sequence lock poisoned".into()))?;
        let id = uuidv7_after(*last);
        *last = Some(id);
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// `MessageStore` backed by the `messages` table.
pub struct PgMessageStore {
    pool: PgPool,
    ids: IdSequence,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ids: IdSequence::default(),
        }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: NewMessage) -> Result<MessageRecord, StoreError> {
        let id = self.ids.next()?;
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, message, from_id, to_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, message, from_id, to_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&message.message)
        .bind(message.from)
        .bind(message.to)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn query_conversation(
        &self,
        a: &Uuid,
        b: &Uuid,
        before: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let mut rows = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, message, from_id, to_id, created_at, updated_at
            FROM messages
            WHERE ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
              AND ($3::uuid IS NULL OR id < $3)
            ORDER BY id DESC
            LIMIT $4
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(before)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.reverse();
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local `MessageStore` for tests and `--ephemeral` runs.
///
/// Built with `with_users`, appends check both parties against the user
/// store the way the `messages` foreign keys do.
#[derive(Default)]
pub struct MemoryMessageStore {
    ids: IdSequence,
    /// Kept in id order; appends only ever push a larger id.
    log: Mutex<Vec<MessageRecord>>,
    users: Option<Arc<dyn UserStore>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Arc<dyn UserStore>) -> Self {
        Self {
            users: Some(users),
            ..Self::default()
        }
    }

    fn log(&self) -> Result<std::sync::MutexGuard<'_, Vec<MessageRecord>>, StoreError> {
        self.log
            .lock()
            .map_err(|_| StoreError::Unavailable("message store lock poisoned".into()))
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, message: NewMessage) -> Result<MessageRecord, StoreError> {
        if let Some(users) = &self.users {
            for (column, id) in [("from_id", &message.from), ("to_id", &message.to)] {
                if users.find_by_id(id).await?.is_none() {
                    return Err(StoreError::MissingReference(column.into()));
                }
            }
        }
        let mut log = self.log()?;
        // Id is minted under the log lock so push order equals id order.
        let id = self.ids.next()?;
        let now = Utc::now();
        let record = MessageRecord {
            id,
            message: message.message,
            from: message.from,
            to: message.to,
            created_at: now,
            updated_at: now,
        };
        log.push(record.clone());
        Ok(record)
    }

    async fn query_conversation(
        &self,
        a: &Uuid,
        b: &Uuid,
        before: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let log = self.log()?;
        let mut page: Vec<MessageRecord> = log
            .iter()
            .rev()
            .filter(|m| (m.from == *a && m.to == *b) || (m.from == *b && m.to == *a))
            .filter(|m| before.is_none_or(|cursor| m.id < cursor))
            .take(limit)
            .cloned()
            .collect();
        page.reverse();
        Ok(page)
    }
}
