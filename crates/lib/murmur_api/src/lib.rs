//! # murmur_api
//!
//! HTTP and WebSocket API library for Murmur.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use murmur_core::auth::TokenCodec;
use murmur_core::delivery::DeliveryCoordinator;
use murmur_core::history::HistoryService;
use murmur_core::messages::{MemoryMessageStore, MessageStore, PgMessageStore};
use murmur_core::presence::PresenceRegistry;
use murmur_core::session::SessionAuthenticator;
use murmur_core::users::{MemoryUserStore, PgUserStore, UserStore};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{auth, messages, ws};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User directory.
    pub users: Arc<dyn UserStore>,
    /// Verifies request and connection credentials.
    pub sessions: SessionAuthenticator,
    /// Send protocol and presence.
    pub delivery: DeliveryCoordinator,
    /// Paginated conversation reads.
    pub history: HistoryService,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire the services together over the given stores.
    pub fn new(
        config: ApiConfig,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttls());
        Self {
            users,
            sessions: SessionAuthenticator::new(codec),
            delivery: DeliveryCoordinator::new(messages.clone(), PresenceRegistry::new()),
            history: HistoryService::new(messages),
            config,
        }
    }

    /// State backed by PostgreSQL.
    pub fn with_pool(config: ApiConfig, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgMessageStore::new(pool)),
        )
    }

    /// State backed by process-local stores; nothing survives a restart.
    pub fn in_memory(config: ApiConfig) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let messages = Arc::new(MemoryMessageStore::with_users(users.clone()));
        Self::new(config, users, messages)
    }
}

/// Run embedded database migrations.
///
/// Delegates to `murmur_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    murmur_core::migrate::migrate(pool).await
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(AllowOrigin::exact(origin)),
        Some(Err(e)) => {
            warn!(error = %e, "ignoring invalid FRONTEND_URL, allowing any origin");
            base.allow_origin(Any)
        }
        None => base.allow_origin(Any),
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh-token", post(auth::refresh_handler))
        // Authenticates the upgrade request itself.
        .route("/ws", get(ws::ws_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/auth/user", get(auth::current_user_handler))
        .route("/messages", get(messages::list_messages_handler))
        .route("/messages/users", get(messages::list_users_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
