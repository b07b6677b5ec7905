//! API server configuration.

use chrono::Duration;
use murmur_core::auth::TokenTtls;
use murmur_core::auth::jwt::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, resolve_jwt_secret};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
    /// Allowed browser origin for CORS. `None` allows any origin.
    pub frontend_url: Option<String>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                              |
    /// |------------------------|--------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3000`                     |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/murmur`   |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file  |
    /// | `JWT_ACCESS_TTL_SECS`  | `900`                                |
    /// | `JWT_REFRESH_TTL_SECS` | `2592000`                            |
    /// | `FRONTEND_URL`         | unset (any origin)                   |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/murmur".into()),
            jwt_secret: resolve_jwt_secret(),
            access_ttl_secs: env_secs("JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl_secs: env_secs("JWT_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS),
            frontend_url: std::env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn token_ttls(&self) -> TokenTtls {
        TokenTtls {
            access: Duration::seconds(self.access_ttl_secs),
            refresh: Duration::seconds(self.refresh_ttl_secs),
        }
    }
}

fn env_secs(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
