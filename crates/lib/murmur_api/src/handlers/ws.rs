//! WebSocket endpoint for real-time messaging.
//!
//! The upgrade request is authenticated before the socket exists; a bad or
//! missing credential gets a 401 and no connection. Once admitted, each text
//! frame is a `ClientEvent` and each outbound event is a `ServerEvent`.

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use murmur_core::delivery::Session;
use murmur_core::models::auth::IdentityClaim;
use murmur_core::models::message::{ClientEvent, ServerEvent};
use murmur_core::presence::ConnectionHandle;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::raw_credential;

/// `GET /ws` — authenticate, then upgrade.
pub async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let claim = state
        .sessions
        .authenticate_connection(raw_credential(&headers))?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, claim)))
}

async fn handle_socket(socket: WebSocket, state: AppState, claim: IdentityClaim) {
    let (handle, mut rx) = ConnectionHandle::channel();
    let session = match state.delivery.admit(claim, handle) {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "connection admission failed");
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // Drain queued events into the socket.
    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to encode server event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_text(&state, &session, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "socket read failed");
                break;
            }
        }
    }

    state.delivery.disconnect(&session);
    forward_task.abort();
}

async fn handle_text(state: &AppState, session: &Session, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::Message(payload)) => {
            // Failures are already reported to the sender as an `error` event.
            let _ = state.delivery.send(session, payload).await;
        }
        Err(e) => {
            debug!(error = %e, "unrecognised client event");
            session
                .handle()
                .deliver(ServerEvent::error("Unrecognised event"));
        }
    }
}
