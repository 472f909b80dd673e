//! Router-level tests against the in-memory store.

use super::error::INTERNAL_ERROR;
use crate::{api::router, password::PasswordHasher, users::memory::MemoryUserStore};
use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Result<(Router, Arc<MemoryUserStore>)> {
    let store = Arc::new(MemoryUserStore::new());
    let hasher = PasswordHasher::new(4)?;
    Ok((router(store.clone(), hasher), store))
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn signup_then_signin() -> Result<()> {
    let (app, _store) = app()?;
    let credentials = json!({"username": "alice", "password": "secret1"});

    let (status, body) = send(&app, post_json("/signup", &credentials)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "User registered successfully!", "username": "alice"})
    );

    let (status, body) = send(&app, post_json("/signin", &credentials)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sign-in successful!");
    assert_eq!(body["username"], "alice");
    assert!(body["user_id"].as_str().is_some_and(|id| id.len() == 36));
    assert!(body.get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_is_conflict() -> Result<()> {
    let (app, store) = app()?;
    let credentials = json!({"username": "alice", "password": "secret1"});

    send(&app, post_json("/signup", &credentials)?).await?;
    let (status, body) = send(&app, post_json("/signup", &credentials)?).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"detail": "Username already exists"}));
    assert_eq!(store.len(), 1);
    Ok(())
}

#[tokio::test]
async fn signup_validation_messages() -> Result<()> {
    let (app, store) = app()?;

    let cases = [
        (json!({"username": "", "password": "secret1"}), "Username and password are required"),
        (json!({"password": "secret1"}), "Username and password are required"),
        (json!({"username": "ab", "password": "secret1"}), "Username too short"),
        (json!({"username": "a".repeat(65), "password": "secret1"}), "Username too long"),
        (json!({"username": "alice", "password": "12345"}), "Password too short"),
        (json!({"username": "alice", "password": "p".repeat(73)}), "Password too long"),
    ];

    for (payload, detail) in cases {
        let (status, body) = send(&app, post_json("/signup", &payload)?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_eq!(body, json!({"detail": detail}), "payload: {payload}");
    }

    assert_eq!(store.len(), 0);
    Ok(())
}

#[tokio::test]
async fn signup_accepts_boundary_lengths() -> Result<()> {
    let (app, store) = app()?;

    for payload in [
        json!({"username": "abc", "password": "123456"}),
        json!({"username": "b".repeat(64), "password": "p".repeat(72)}),
    ] {
        let (status, _) = send(&app, post_json("/signup", &payload)?).await?;
        assert_eq!(status, StatusCode::OK, "payload: {payload}");
    }

    assert_eq!(store.len(), 2);
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_bad_request() -> Result<()> {
    let (app, _store) = app()?;

    for uri in ["/signup", "/signin"] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))?;
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(body, json!({"detail": "Username and password are required"}));

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())?;
        let (status, _) = send(&app, request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
    }
    Ok(())
}

#[tokio::test]
async fn signin_failures_share_one_response() -> Result<()> {
    let (app, _store) = app()?;
    send(
        &app,
        post_json("/signup", &json!({"username": "alice", "password": "secret1"}))?,
    )
    .await?;

    let wrong_password = send(
        &app,
        post_json("/signin", &json!({"username": "alice", "password": "nope123"}))?,
    )
    .await?;
    let unknown_user = send(
        &app,
        post_json("/signin", &json!({"username": "mallory", "password": "secret1"}))?,
    )
    .await?;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password.1, json!({"detail": "Invalid credentials"}));
    Ok(())
}

#[tokio::test]
async fn signin_missing_fields_is_bad_request() -> Result<()> {
    let (app, _store) = app()?;

    let (status, body) = send(&app, post_json("/signin", &json!({"username": "alice"}))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Username and password are required"}));
    Ok(())
}

#[tokio::test]
async fn storage_failure_is_generic_500() -> Result<()> {
    let (app, store) = app()?;
    store.set_unavailable(true);

    let credentials = json!({"username": "alice", "password": "secret1"});
    for uri in ["/signup", "/signin"] {
        let (status, body) = send(&app, post_json(uri, &credentials)?).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "uri: {uri}");
        assert_eq!(body, json!({"detail": INTERNAL_ERROR}));
    }
    Ok(())
}

#[tokio::test]
async fn root_reports_healthy() -> Result<()> {
    let (app, _store) = app()?;

    let request = Request::builder().uri("/").body(Body::empty())?;
    let (status, body) = send(&app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn health_follows_database() -> Result<()> {
    let (app, store) = app()?;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let x_app = response
        .headers()
        .get("X-App")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(x_app.starts_with(concat!(env!("CARGO_PKG_NAME"), ":", env!("CARGO_PKG_VERSION"))));

    store.set_unavailable(true);
    let request = Request::builder().uri("/health").body(Body::empty())?;
    let (status, body) = send(&app, request).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "error");
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_or_propagated() -> Result<()> {
    let (app, _store) = app()?;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    let generated = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert_eq!(generated.len(), 26);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "caller-supplied")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"caller-supplied"[..])
    );
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let (app, _store) = app()?;

    let request = Request::builder().uri("/openapi.json").body(Body::empty())?;
    let (status, body) = send(&app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/signup"]["post"].is_object());
    assert!(body["paths"]["/signin"]["post"].is_object());
    Ok(())
}
