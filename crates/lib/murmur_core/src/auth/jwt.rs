//! JWT token generation and verification.
//!
//! Tokens are HS256, self-contained and never stored. The payload carries a
//! `kind` tag so an access token can't be redeemed as a refresh token and
//! vice versa. Both operations take the current time explicitly.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use thiserror::Error;
use tracing::info;

use super::AuthError;
use crate::models::auth::{IdentityClaim, TokenClaims, TokenKind};

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;

/// Default refresh token lifetime: 30 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("expected {expected} token, got {found}")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// Independent lifetimes for the two token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
}

impl TokenTtls {
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access,
            TokenKind::Refresh => self.refresh,
        }
    }
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
        }
    }
}

/// Signs and verifies identity tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttls: TokenTtls,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttls", &self.ttls)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttls: TokenTtls) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttls,
        }
    }

    pub fn ttls(&self) -> TokenTtls {
        self.ttls
    }

    /// Sign a token of `kind` for `claim`, expiring at `now + ttl(kind)`.
    ///
    /// `exp` is whole seconds, so a sub-second expiry instant is rounded up:
    /// the token is never rejected before its full TTL has elapsed.
    pub fn issue(
        &self,
        claim: &IdentityClaim,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: claim.id.clone(),
            username: claim.username.clone(),
            kind,
            exp: ceil_timestamp(now + self.ttls.ttl(kind)),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify signature, expiry (against `now`) and kind.
    pub fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IdentityClaim, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.kind != kind {
            return Err(TokenError::WrongKind {
                expected: kind,
                found: claims.kind,
            });
        }
        Ok(claims.identity())
    }
}

fn ceil_timestamp(at: DateTime<Utc>) -> i64 {
    if at.timestamp_subsec_nanos() > 0 {
        at.timestamp() + 1
    } else {
        at.timestamp()
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("murmur")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn codec() -> TokenCodec {
        TokenCodec::new(
            b"test-secret",
            TokenTtls {
                access: Duration::seconds(60),
                refresh: Duration::seconds(3600),
            },
        )
    }

    fn alice() -> IdentityClaim {
        IdentityClaim {
            id: "1".into(),
            username: "alice".into(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn access_token_round_trips_before_expiry() {
        let codec = codec();
        let token = codec.issue(&alice(), TokenKind::Access, t0()).unwrap();

        let claim = codec
            .verify(&token, TokenKind::Access, t0() + Duration::seconds(59))
            .unwrap();
        assert_eq!(claim, alice());
    }

    #[test]
    fn token_expires_exactly_at_ttl() {
        let codec = codec();
        let token = codec.issue(&alice(), TokenKind::Access, t0()).unwrap();

        let err = codec
            .verify(&token, TokenKind::Access, t0() + Duration::seconds(60))
            .unwrap_err();
        assert_eq!(err, TokenError::Expired);

        let err = codec
            .verify(&token, TokenKind::Access, t0() + Duration::days(1))
            .unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn sub_second_issue_keeps_full_ttl() {
        let codec = codec();
        let issued = t0() + Duration::milliseconds(900);
        let token = codec.issue(&alice(), TokenKind::Access, issued).unwrap();

        assert!(
            codec
                .verify(&token, TokenKind::Access, issued + Duration::milliseconds(59_500))
                .is_ok()
        );
        assert!(
            codec
                .verify(&token, TokenKind::Access, issued + Duration::milliseconds(59_999))
                .is_ok()
        );
        assert_eq!(
            codec
                .verify(&token, TokenKind::Access, t0() + Duration::seconds(61))
                .unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn ttls_are_independent_per_kind() {
        let codec = codec();
        let refresh = codec.issue(&alice(), TokenKind::Refresh, t0()).unwrap();
        let later = t0() + Duration::seconds(600);

        assert!(codec.verify(&refresh, TokenKind::Refresh, later).is_ok());
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let codec = codec();
        let access = codec.issue(&alice(), TokenKind::Access, t0()).unwrap();
        let refresh = codec.issue(&alice(), TokenKind::Refresh, t0()).unwrap();

        assert_eq!(
            codec.verify(&refresh, TokenKind::Access, t0()).unwrap_err(),
            TokenError::WrongKind {
                expected: TokenKind::Access,
                found: TokenKind::Refresh,
            }
        );
        assert_eq!(
            codec.verify(&access, TokenKind::Refresh, t0()).unwrap_err(),
            TokenError::WrongKind {
                expected: TokenKind::Refresh,
                found: TokenKind::Access,
            }
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = codec().issue(&alice(), TokenKind::Access, t0()).unwrap();
        let other = TokenCodec::new(b"other-secret", TokenTtls::default());

        assert_eq!(
            other.verify(&token, TokenKind::Access, t0()).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        for raw in ["", "not-a-jwt", "a.b.c", "Bearer x.y.z"] {
            assert_eq!(
                codec.verify(raw, TokenKind::Access, t0()).unwrap_err(),
                TokenError::Malformed,
                "input {raw:?}"
            );
        }
    }
}
