//! Delivery coordinator — the message-send protocol.
//!
//! Each inbound send runs authorize → validate → persist → normalize →
//! fan-out and stops at the first failure. Failures are reported to the
//! sender as an `error` event; the connection itself stays open.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::error::StoreError;
use crate::messages::MessageStore;
use crate::models::auth::IdentityClaim;
use crate::models::message::{NewMessage, SendMessage, ServerEvent, WireMessage};
use crate::presence::{ConnectionHandle, PresenceRegistry};

/// Why a single send was refused.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DeliveryError {
    /// Text sent back to the client in the `error` event.
    fn client_message(&self) -> String {
        match self {
            DeliveryError::Validation(msg) => msg.clone(),
            DeliveryError::Store(_) => "Failed to send message".to_string(),
        }
    }
}

/// An admitted connection: the claim verified at upgrade plus its outbound handle.
///
/// Only `DeliveryCoordinator::admit` creates one, so every send is authorized
/// by construction.
#[derive(Debug, Clone)]
pub struct Session {
    claim: IdentityClaim,
    user_id: Uuid,
    handle: ConnectionHandle,
}

impl Session {
    pub fn claim(&self) -> &IdentityClaim {
        &self.claim
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub message: WireMessage,
    /// Connections the message event was handed to (sender echo included).
    pub delivered: usize,
}

/// Orchestrates persistence and fan-out for live connections.
#[derive(Clone)]
pub struct DeliveryCoordinator {
    store: Arc<dyn MessageStore>,
    presence: PresenceRegistry,
}

impl DeliveryCoordinator {
    pub fn new(store: Arc<dyn MessageStore>, presence: PresenceRegistry) -> Self {
        Self { store, presence }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// Admit an authenticated connection into the presence registry.
    ///
    /// A newer connection for the same user replaces the older entry; the
    /// older connection stays open but no longer receives recipient fan-out.
    pub fn admit(
        &self,
        claim: IdentityClaim,
        handle: ConnectionHandle,
    ) -> Result<Session, AuthError> {
        let user_id = Uuid::parse_str(&claim.id).map_err(|_| AuthError::Unauthorized)?;
        if let Some(old) = self.presence.register(&claim.id, handle.clone()) {
            info!(user = %claim.username, displaced = %old.id(), "user reconnected");
        }
        info!(user = %claim.username, connection = %handle.id(), "user connected");
        Ok(Session {
            claim,
            user_id,
            handle,
        })
    }

    /// Drop the session's presence entry if it is still the current one.
    pub fn disconnect(&self, session: &Session) -> bool {
        let removed = self.presence.unregister(&session.claim.id, &session.handle);
        info!(
            user = %session.claim.username,
            connection = %session.handle.id(),
            removed,
            "user disconnected"
        );
        removed
    }

    /// Run the send protocol for one inbound `message` event.
    pub async fn send(
        &self,
        session: &Session,
        payload: SendMessage,
    ) -> Result<DeliveryReport, DeliveryError> {
        match self.try_send(session, payload).await {
            Ok(report) => Ok(report),
            Err(e) => {
                match &e {
                    DeliveryError::Validation(reason) => {
                        debug!(user = %session.claim.username, reason, "send rejected");
                    }
                    DeliveryError::Store(err) => {
                        warn!(user = %session.claim.username, error = %err, "failed to persist message");
                    }
                }
                session.handle.deliver(ServerEvent::error(e.client_message()));
                Err(e)
            }
        }
    }

    async fn try_send(
        &self,
        session: &Session,
        payload: SendMessage,
    ) -> Result<DeliveryReport, DeliveryError> {
        let to = payload.to.as_deref().map(str::trim).unwrap_or_default();
        if payload.message.trim().is_empty() || to.is_empty() {
            return Err(DeliveryError::Validation(
                "Message and recipient are required".into(),
            ));
        }
        let to = Uuid::parse_str(to)
            .map_err(|_| DeliveryError::Validation("Invalid recipient id".into()))?;

        let record = self
            .store
            .append(NewMessage {
                message: payload.message,
                from: session.user_id,
                to,
            })
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(_) => {
                    DeliveryError::Validation("Unknown recipient".into())
                }
                other => DeliveryError::Store(other),
            })?;
        let wire = WireMessage::from(&record);

        let mut delivered = 0;
        if to != session.user_id {
            match self.presence.lookup(&to.to_string()) {
                Some(recipient) if recipient != session.handle => {
                    if recipient.deliver(ServerEvent::Message(wire.clone())) {
                        delivered += 1;
                    }
                }
                Some(_) => {}
                None => debug!(recipient = %to, "recipient offline"),
            }
        }
        if session.handle.deliver(ServerEvent::Message(wire.clone())) {
            delivered += 1;
        }

        debug!(id = %wire.id, from = %wire.from, to = %wire.to, delivered, "message sent");
        Ok(DeliveryReport {
            message: wire,
            delivered,
        })
    }
}
