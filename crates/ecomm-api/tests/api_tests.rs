//! API Integration Tests
//!
//! Every test drives the full router over an in-memory store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ecomm_api::auth::{PasswordConfig, RegisterRequest};
use ecomm_api::{create_router, AppState};
use ecomm_core::{AppConfig, AuthConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "Passw0rd!";
const ADMIN_EMAIL: &str = "admin@shop.test";

/// Router over a fresh in-memory store with one admin account
async fn test_app() -> Router {
    let config = AppConfig {
        auth: AuthConfig::with_signing_key("integration-test-secret"),
        ..AppConfig::default()
    };
    let state = AppState::in_memory(config)
        .unwrap()
        .with_password_config(PasswordConfig::fast());

    state
        .auth
        .register(
            RegisterRequest {
                name: "Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: PASSWORD.to_string(),
            },
            true,
        )
        .await
        .unwrap();

    create_router(Arc::new(state))
}

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/v1/users",
            None,
            Some(json!({ "name": "Customer", "email": email, "password": PASSWORD })),
        ),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await
}

async fn refresh(app: &Router, session_id: &str, refresh_token: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/v1/sessions/refresh",
            None,
            Some(json!({ "session_id": session_id, "refresh_token": refresh_token })),
        ),
    )
    .await
}

fn field<'a>(json: &'a Value, name: &str) -> &'a str {
    json[name].as_str().unwrap()
}

// =============================================================================
// Health and docs
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let (status, json) = send(&app, create_json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app().await;
    let (status, json) = send(
        &app,
        create_json_request("GET", "/api-docs/openapi.json", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/v1/auth/login"].is_object());
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = test_app().await;
    let (status, json) = register(&app, "buyer@shop.test").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["email"], "buyer@shop.test");
    assert_eq!(json["is_admin"], false);
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (status, json) = register(&app, "buyer@shop.test").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_weak_password() {
    let app = test_app().await;
    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/users",
            None,
            Some(json!({ "name": "Weak", "email": "weak@shop.test", "password": "password" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (status, json) = login(&app, "buyer@shop.test", PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["session_id"].is_string());
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
    assert!(json["access_token_expires_at"].is_string());
    assert!(json["refresh_token_expires_at"].is_string());
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_email_look_the_same() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;

    let (wrong_status, wrong) = login(&app, "buyer@shop.test", "Passw0rd?").await;
    let (unknown_status, unknown) = login(&app, "ghost@shop.test", PASSWORD).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong, unknown);
}

// =============================================================================
// Authorization gate
// =============================================================================

#[tokio::test]
async fn test_me_requires_token() {
    let app = test_app().await;
    let (status, json) = send(&app, create_json_request("GET", "/api/v1/auth/me", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_wrong_scheme_is_rejected() {
    let app = test_app().await;
    let (_, session) = login(&app, ADMIN_EMAIL, PASSWORD).await;

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(
            "Authorization",
            format!("Token {}", field(&session, "access_token")),
        )
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = test_app().await;
    let (status, json) = send(
        &app,
        create_json_request("GET", "/api/v1/auth/me", Some("not.a.token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHENTICATED");
    assert!(json["details"].is_string());
}

#[tokio::test]
async fn test_me_with_token() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;

    let (status, json) = send(
        &app,
        create_json_request(
            "GET",
            "/api/v1/auth/me",
            Some(field(&session, "access_token")),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "buyer@shop.test");
}

#[tokio::test]
async fn test_refresh_token_cannot_authorize_requests() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;
    let refresh_token = field(&session, "refresh_token");

    let (status, json) = send(
        &app,
        create_json_request("GET", "/api/v1/auth/me", Some(refresh_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHENTICATED");

    // Still rejected once the session is gone
    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/logout",
            Some(field(&session, "access_token")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        create_json_request("GET", "/api/v1/auth/me", Some(refresh_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extra_whitespace_in_authorization_header_is_accepted() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header(
            "Authorization",
            format!("Bearer  {}", field(&session, "access_token")),
        )
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "buyer@shop.test");
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_refresh_after_login() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;

    let (status, json) = refresh(
        &app,
        field(&session, "session_id"),
        field(&session, "refresh_token"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let access_token = field(&json, "access_token");

    let (status, _) = send(
        &app,
        create_json_request("GET", "/api/v1/auth/me", Some(access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_foreign_token() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, first) = login(&app, "buyer@shop.test", PASSWORD).await;
    let (_, second) = login(&app, "buyer@shop.test", PASSWORD).await;

    let (status, json) = refresh(
        &app,
        field(&first, "session_id"),
        field(&second, "refresh_token"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "TOKEN_MISMATCH");
}

#[tokio::test]
async fn test_refresh_unknown_session() {
    let app = test_app().await;
    let (status, json) = refresh(&app, "no-such-session", "token").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_logout_revokes_session_but_not_access_token() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;
    let access_token = field(&session, "access_token");

    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/v1/auth/logout", Some(access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Second logout is a no-op
    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/v1/auth/logout", Some(access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = refresh(
        &app,
        field(&session, "session_id"),
        field(&session, "refresh_token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "SESSION_REVOKED");

    // The gate does not consult sessions
    let (status, _) = send(
        &app,
        create_json_request("GET", "/api/v1/auth/me", Some(access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_leaves_other_sessions_active() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, first) = login(&app, "buyer@shop.test", PASSWORD).await;
    let (_, second) = login(&app, "buyer@shop.test", PASSWORD).await;

    send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/auth/logout",
            Some(field(&first, "access_token")),
            None,
        ),
    )
    .await;

    let (status, _) = refresh(
        &app,
        field(&second, "session_id"),
        field(&second, "refresh_token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Administrative revocation
// =============================================================================

#[tokio::test]
async fn test_revoke_requires_admin() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;
    let uri = format!("/api/v1/sessions/{}/revoke", field(&session, "session_id"));

    let (status, json) = send(
        &app,
        create_json_request("POST", &uri, Some(field(&session, "access_token")), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, _) = send(&app, create_json_request("POST", &uri, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_revokes_session() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;
    let (_, admin) = login(&app, ADMIN_EMAIL, PASSWORD).await;
    let uri = format!("/api/v1/sessions/{}/revoke", field(&session, "session_id"));

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            create_json_request("POST", &uri, Some(field(&admin, "access_token")), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = refresh(
        &app,
        field(&session, "session_id"),
        field(&session, "refresh_token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "SESSION_REVOKED");
}

#[tokio::test]
async fn test_admin_revokes_unknown_session() {
    let app = test_app().await;
    let (_, admin) = login(&app, ADMIN_EMAIL, PASSWORD).await;

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/v1/sessions/missing/revoke",
            Some(field(&admin, "access_token")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Account deletion
// =============================================================================

#[tokio::test]
async fn test_delete_account() {
    let app = test_app().await;
    register(&app, "buyer@shop.test").await;
    let (_, session) = login(&app, "buyer@shop.test", PASSWORD).await;

    let (status, _) = send(
        &app,
        create_json_request(
            "DELETE",
            "/api/v1/users/me",
            Some(field(&session, "access_token")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = login(&app, "buyer@shop.test", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = refresh(
        &app,
        field(&session, "session_id"),
        field(&session, "refresh_token"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
