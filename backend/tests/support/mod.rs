#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use signcast_backend::{
    config::Config,
    models::user::User,
    repositories::{MemoryLoginAttemptStore, MemorySessionStore, MemoryUserStore, UserStoreTrait},
    routes,
    state::AppState,
    utils::{jwt::create_access_token, password::hash_password},
};

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: "memory".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration_hours: 1,
        session_stale_hours: 24,
        device_stale_seconds: 15,
        login_attempt_ttl_seconds: 120,
        login_arbitration_enabled: false,
    }
}

/// In-memory application state plus handles to the raw stores, for tests
/// that need to seed or inspect rows directly.
pub struct TestContext {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub attempts: Arc<MemoryLoginAttemptStore>,
}

pub fn test_context() -> TestContext {
    test_context_with_config(test_config())
}

pub fn test_context_with_config(config: Config) -> TestContext {
    let users = Arc::new(MemoryUserStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let attempts = Arc::new(MemoryLoginAttemptStore::new());
    let state = AppState::new(config, users.clone(), sessions.clone(), attempts.clone());
    TestContext {
        state,
        users,
        sessions,
        attempts,
    }
}

pub fn test_router(ctx: &TestContext) -> Router {
    routes::api_router(ctx.state.clone())
}

pub async fn seed_user(ctx: &TestContext, email: &str, password: &str) -> User {
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: hash_password(password).expect("hash password"),
        display_name: Some("Test Operator".to_string()),
        created_at: Utc::now(),
    };
    ctx.users.insert(&user).await.expect("insert user");
    user
}

pub fn bearer_token_for(user: &User) -> String {
    create_access_token(user.id.clone(), user.email.clone(), TEST_JWT_SECRET, 1)
        .expect("create token")
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse body")
    };
    (status, json)
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send_json(app, Method::POST, uri, token, Some(body)).await
}

pub async fn get_json(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send_json(app, Method::GET, uri, token, None).await
}
