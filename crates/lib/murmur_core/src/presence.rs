//! Presence registry — which user is live on which connection.
//!
//! One entry per user id, last-connect-wins. Removal is guarded by the
//! connection id so a late disconnect of a replaced connection can't evict
//! its successor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::models::message::ServerEvent;

/// Events queued per connection before further deliveries are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Process-unique connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next connection id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ConnectionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound side of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a handle plus the receiver the connection's writer task drains.
    pub fn channel() -> (Self, mpsc::Receiver<ServerEvent>) {
        Self::with_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                id: ConnectionId::next(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event for this connection without waiting.
    ///
    /// Returns `false` when the connection is gone or its queue is full; the
    /// event is dropped in both cases.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(connection = %self.id, "outbound queue full, dropped event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection = %self.id, "dropped event for closed connection");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// Concurrent map from user id to that user's live connection.
#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    entries: Arc<DashMap<String, ConnectionHandle>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `user_id`, returning the displaced handle.
    pub fn register(&self, user_id: &str, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let displaced = self.entries.insert(user_id.to_string(), handle);
        if let Some(old) = &displaced {
            debug!(user_id, displaced = %old.id(), "presence entry replaced");
        }
        displaced
    }

    /// Remove the entry for `user_id` only if it still belongs to `handle`.
    pub fn unregister(&self, user_id: &str, handle: &ConnectionHandle) -> bool {
        self.entries
            .remove_if(user_id, |_, current| current.id() == handle.id())
            .is_some()
    }

    /// The live connection for `user_id`, if any.
    pub fn lookup(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.entries.get(user_id).map(|entry| entry.value().clone())
    }

    /// Number of users currently online.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
