//! Message models and the wire boundary.
//!
//! `MessageRecord` is what the stores hand back. Anything leaving the process
//! goes through `WireMessage`, which flattens every identifier to a bare
//! string and every timestamp to an ISO-8601 string.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored direct message.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: Uuid,
    pub message: String,
    #[sqlx(rename = "from_id")]
    pub from: Uuid,
    #[sqlx(rename = "to_id")]
    pub to: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `MessageStore::append`; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub message: String,
    pub from: Uuid,
    pub to: Uuid,
}

/// External representation of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: String,
    pub message: String,
    pub from: String,
    pub to: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&MessageRecord> for WireMessage {
    fn from(record: &MessageRecord) -> Self {
        Self {
            id: record.id.to_string(),
            message: record.message.clone(),
            from: record.from.to_string(),
            to: record.to.to_string(),
            created_at: iso8601(&record.created_at),
            updated_at: iso8601(&record.updated_at),
        }
    }
}

impl From<MessageRecord> for WireMessage {
    fn from(record: MessageRecord) -> Self {
        Self::from(&record)
    }
}

fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Payload of a client `message` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub to: Option<String>,
}

/// Payload of a server `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}

/// Events a client sends over its connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    Message(SendMessage),
}

/// Events the server pushes to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    Message(WireMessage),
    Error(ErrorEvent),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorEvent {
            message: message.into(),
        })
    }
}
