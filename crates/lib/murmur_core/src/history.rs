//! History service — paginated reads of a two-party conversation.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::error::StoreError;
use crate::messages::MessageStore;
use crate::models::message::WireMessage;

/// Messages per page.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Serves backward cursor pagination over the message store.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn MessageStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// The page of the conversation between `requester` and `channel_id`
    /// ending just before `cursor` (or the latest page), oldest first.
    ///
    /// To page backward, pass the id of the oldest message currently held.
    pub async fn list(
        &self,
        requester: &Uuid,
        channel_id: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Vec<WireMessage>, HistoryError> {
        let channel = channel_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| HistoryError::BadRequest("Channel (to user ID) is required".into()))?;
        let channel = Uuid::parse_str(channel)
            .map_err(|_| HistoryError::BadRequest("Invalid channel id".into()))?;
        let before = match cursor.map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| HistoryError::BadRequest("Invalid cursor".into()))?,
            ),
            None => None,
        };

        let records = self
            .store
            .query_conversation(requester, &channel, before, PAGE_SIZE)
            .await?;
        Ok(records.iter().map(WireMessage::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MemoryMessageStore;
    use crate::models::message::NewMessage;

    async fn seeded(n: usize) -> (HistoryService, Uuid, Uuid, Vec<String>) {
        let store = Arc::new(MemoryMessageStore::new());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut ids = Vec::new();
        for i in 0..n {
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            let rec = store
                .append(NewMessage {
                    message: format!("m{i}"),
                    from,
                    to,
                })
                .await
                .unwrap();
            ids.push(rec.id.to_string());
        }
        (HistoryService::new(store), a, b, ids)
    }

    #[tokio::test]
    async fn channel_is_required() {
        let (history, a, _, _) = seeded(0).await;
        for channel in [None, Some(""), Some("  ")] {
            let err = history.list(&a, channel, None).await.unwrap_err();
            assert!(matches!(err, HistoryError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_requests() {
        let (history, a, b, _) = seeded(1).await;
        let b = b.to_string();
        assert!(matches!(
            history.list(&a, Some("xyz"), None).await,
            Err(HistoryError::BadRequest(_))
        ));
        assert!(matches!(
            history.list(&a, Some(&b), Some("xyz")).await,
            Err(HistoryError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn walks_history_backwards_without_gaps() {
        let (history, a, b, ids) = seeded(23).await;
        let b = b.to_string();

        let latest = history.list(&a, Some(&b), None).await.unwrap();
        assert_eq!(latest.len(), PAGE_SIZE);
        assert_eq!(latest.last().unwrap().id, ids[22]);

        let mut seen: Vec<String> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = history
                .list(&a, Some(&b), cursor.as_deref())
                .await
                .unwrap();
            let Some(oldest) = page.first() else { break };
            cursor = Some(oldest.id.clone());
            let mut batch: Vec<String> = page.iter().map(|m| m.id.clone()).collect();
            batch.extend(seen);
            seen = batch;
        }
        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn both_participants_see_the_same_page() {
        let (history, a, b, _) = seeded(12).await;
        let from_a = history.list(&a, Some(&b.to_string()), None).await.unwrap();
        let from_b = history.list(&b, Some(&a.to_string()), None).await.unwrap();
        assert_eq!(from_a, from_b);
    }
}
