//! Shared helpers for API integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use murmur_api::AppState;
use murmur_api::config::ApiConfig;
use murmur_core::auth::jwt::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};
use serde_json::Value;
use tower::ServiceExt;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("murmur_api=debug,murmur_core=debug")
        .try_init();
}

/// Fixed secret and default lifetimes; nothing is read from the environment.
pub fn config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: String::new(),
        jwt_secret: "test-secret".into(),
        access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
        refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        frontend_url: None,
    }
}

pub fn state() -> AppState {
    init_tracing();
    AppState::in_memory(config())
}

/// Issue one request against a fresh router over `state` and decode the JSON body.
pub async fn call(
    state: &AppState,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = auth {
        req = req.header("authorization", token);
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    send(state, req).await
}

/// Like `call`, but with an arbitrary body and optional content type.
pub async fn call_raw(
    state: &AppState,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        req = req.header("content-type", ct);
    }
    send(state, req.body(Body::from(body.to_string())).unwrap()).await
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let app: Router = murmur_api::router(state.clone());
    let resp = app.oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

/// Sign up `username` and return `(user id, access token, refresh token)`.
pub async fn signup(state: &AppState, username: &str) -> (String, String, String) {
    let (status, json) = call(
        state,
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({"username": username, "password": "secret-pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup {username}: {json}");
    let data = &json["data"];
    (
        data["user"]["id"].as_str().unwrap().to_string(),
        data["accessToken"].as_str().unwrap().to_string(),
        data["refreshToken"].as_str().unwrap().to_string(),
    )
}
