//! Integration tests for the account endpoints and the auth middleware.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{call, call_raw, signup, state};

#[tokio::test]
async fn signup_with_short_password_is_bad_request() {
    let state = state();
    let (status, json) = call(
        &state,
        "POST",
        "/auth/signup",
        None,
        Some(json!({"username": "alice", "password": "abc"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("at least 6"));
}

#[tokio::test]
async fn signup_twice_with_same_username_fails() {
    let state = state();
    signup(&state, "alice").await;

    let (status, json) = call(
        &state,
        "POST",
        "/auth/signup",
        None,
        Some(json!({"username": "alice", "password": "another-pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Username already exists");
}

#[tokio::test]
async fn signup_returns_user_and_tokens() {
    let state = state();
    let (status, json) = call(
        &state,
        "POST",
        "/auth/signup",
        None,
        Some(json!({"username": "carol", "password": "secret-pw"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "success");
    let data = &json["data"];
    assert_eq!(data["user"]["username"], "carol");
    assert!(data["user"]["id"].is_string());
    assert!(data["user"].get("passwordHash").is_none());
    assert!(data["accessToken"].is_string());
    assert!(data["refreshToken"].is_string());
}

#[tokio::test]
async fn login_does_not_reveal_whether_username_exists() {
    let state = state();
    signup(&state, "alice").await;

    let (wrong_pw_status, wrong_pw) = call(
        &state,
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong-pw"})),
    )
    .await;
    let (unknown_status, unknown) = call(
        &state,
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "nobody", "password": "wrong-pw"})),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);

    let (ok_status, ok) = call(
        &state,
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "secret-pw"})),
    )
    .await;
    assert_eq!(ok_status, StatusCode::OK);
    assert_eq!(ok["data"]["user"]["username"], "alice");
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let state = state();
    for uri in ["/auth/signup", "/auth/login"] {
        let (status, _) = call(&state, "POST", uri, None, Some(json!({"username": "alice"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    let (status, _) = call(&state, "POST", "/auth/refresh-token", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_bodies_get_the_error_envelope() {
    let state = state();
    let cases = [
        ("/auth/login", Some("application/json"), "{not json"),
        ("/auth/signup", Some("application/json"), "[1, 2]"),
        ("/auth/refresh-token", Some("text/plain"), r#"{"refreshToken": "x"}"#),
        ("/auth/login", None, ""),
    ];
    for (uri, content_type, body) in cases {
        let (status, json) = call_raw(&state, "POST", uri, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body:?}");
        assert_eq!(json["status"], "error", "{uri} {body:?}");
        assert_eq!(json["error"], "validation_error");
        assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn current_user_accepts_raw_token_only() {
    let state = state();
    let (id, access, _) = signup(&state, "alice").await;

    let (status, json) = call(&state, "GET", "/auth/user", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["user"]["id"], id.as_str());

    let bearer = format!("Bearer {access}");
    let (status, _) = call(&state, "GET", "/auth/user", Some(&bearer), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_and_invalid_credentials_get_identical_responses() {
    let state = state();

    let (missing_status, missing) = call(&state, "GET", "/messages/users", None, None).await;
    let (invalid_status, invalid) =
        call(&state, "GET", "/messages/users", Some("not-a-token"), None).await;

    assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid_status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, invalid);
}

#[tokio::test]
async fn refresh_token_mints_access_but_is_not_one() {
    let state = state();
    let (_, access, refresh) = signup(&state, "alice").await;

    // A refresh token can't authenticate a request...
    let (status, _) = call(&state, "GET", "/auth/user", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // ...and an access token can't be redeemed.
    let (status, _) = call(
        &state,
        "POST",
        "/auth/refresh-token",
        None,
        Some(json!({"refreshToken": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = call(
        &state,
        "POST",
        "/auth/refresh-token",
        None,
        Some(json!({"refreshToken": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = json["data"]["accessToken"].as_str().unwrap();

    let (status, json) = call(&state, "GET", "/auth/user", Some(fresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["user"]["username"], "alice");
}

#[tokio::test]
async fn user_directory_excludes_requester() {
    let state = state();
    let (_, alice_token, _) = signup(&state, "alice").await;
    let (bob_id, _, _) = signup(&state, "bob").await;

    let (status, json) = call(&state, "GET", "/messages/users", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([{"id": bob_id, "username": "bob"}]));
}

#[tokio::test]
async fn history_requires_channel() {
    let state = state();
    let (_, token, _) = signup(&state, "alice").await;

    let (status, json) = call(&state, "GET", "/messages", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
}
