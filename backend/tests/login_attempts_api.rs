//! Cross-browser login attempt endpoints, including the arbitration-enabled
//! login path.

use axum::http::StatusCode;
use serde_json::json;

mod support;

use support::{
    bearer_token_for, get_json, post_json, seed_user, test_config, test_context,
    test_context_with_config, test_router,
};

async fn login_as(
    app: &axum::Router,
    email: &str,
    browser_id: &str,
) -> (StatusCode, serde_json::Value) {
    post_json(
        app,
        "/api/auth/login",
        None,
        json!({
            "email": email,
            "password": "hunter2",
            "page": "remote",
            "browserId": browser_id,
        }),
    )
    .await
}

#[tokio::test]
async fn create_reports_no_conflict_without_active_session() {
    let ctx = test_context();
    let app = test_router(&ctx);

    let (status, body) = post_json(
        &app,
        "/api/login-attempts",
        None,
        json!({
            "userId": "u1",
            "email": "op@example.com",
            "browserId": "browser-b",
            "browserInfo": "Mozilla/5.0",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_conflict");
    assert!(body.get("attemptId").is_none());
}

#[tokio::test]
async fn create_short_circuits_for_same_browser() {
    let ctx = test_context();
    let app = test_router(&ctx);
    seed_user(&ctx, "op@example.com", "hunter2").await;
    login_as(&app, "op@example.com", "browser-a").await;

    let (status, body) = post_json(
        &app,
        "/api/login-attempts",
        None,
        json!({
            "userId": "u1",
            "email": "op@example.com",
            "browserId": "browser-a",
            "browserInfo": "Mozilla/5.0",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "same_browser");
}

#[tokio::test]
async fn pending_attempt_flows_through_approval() {
    let ctx = test_context();
    let app = test_router(&ctx);
    let user = seed_user(&ctx, "op@example.com", "hunter2").await;
    login_as(&app, "op@example.com", "browser-a").await;

    // A second browser knocks.
    let (status, body) = post_json(
        &app,
        "/api/login-attempts",
        None,
        json!({
            "userId": user.id,
            "email": "op@example.com",
            "browserId": "browser-b",
            "browserInfo": "Mozilla/5.0",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    let attempt_id = body["attemptId"].as_str().expect("attempt id").to_string();

    // The waiting browser polls.
    let (status, body) = get_json(
        &app,
        &format!("/api/login-attempts/status?attemptId={}", attempt_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    // The active operator approves.
    let token = bearer_token_for(&user);
    let (status, body) = post_json(
        &app,
        "/api/login-attempts/respond",
        Some(&token),
        json!({"attemptId": attempt_id, "decision": "approve"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["decision"], "approve");

    // Status reflects the decision; the session is gone so the waiting
    // browser's retry will succeed.
    let (_, body) = get_json(
        &app,
        &format!("/api/login-attempts/status?attemptId={}", attempt_id),
        None,
    )
    .await;
    assert_eq!(body["status"], "approved");
    assert!(ctx.state.sessions.get_active_session().await.is_none());
}

#[tokio::test]
async fn denied_attempt_leaves_session_in_place() {
    let ctx = test_context();
    let app = test_router(&ctx);
    let user = seed_user(&ctx, "op@example.com", "hunter2").await;
    login_as(&app, "op@example.com", "browser-a").await;

    let (_, body) = post_json(
        &app,
        "/api/login-attempts",
        None,
        json!({
            "userId": user.id,
            "email": "op@example.com",
            "browserId": "browser-b",
            "browserInfo": "Mozilla/5.0",
        }),
    )
    .await;
    let attempt_id = body["attemptId"].as_str().expect("attempt id").to_string();

    let token = bearer_token_for(&user);
    let (status, body) = post_json(
        &app,
        "/api/login-attempts/respond",
        Some(&token),
        json!({"attemptId": attempt_id, "decision": "deny"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let active = ctx
        .state
        .sessions
        .get_active_session()
        .await
        .expect("session survives denial");
    assert_eq!(active.browser_id, "browser-a");
}

#[tokio::test]
async fn status_of_unknown_attempt_is_404() {
    let ctx = test_context();
    let app = test_router(&ctx);

    let (status, body) = get_json(
        &app,
        "/api/login-attempts/status?attemptId=no-such-attempt",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn respond_requires_auth() {
    let ctx = test_context();
    let app = test_router(&ctx);

    let (status, _) = post_json(
        &app,
        "/api/login-attempts/respond",
        None,
        json!({"attemptId": "x", "decision": "approve"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn arbitration_enabled_login_parks_conflicts_as_pending() {
    let mut config = test_config();
    config.login_arbitration_enabled = true;
    let ctx = test_context_with_config(config);
    let app = test_router(&ctx);
    seed_user(&ctx, "op@example.com", "hunter2").await;

    let (status, _) = login_as(&app, "op@example.com", "browser-a").await;
    assert_eq!(status, StatusCode::OK, "first login has nothing to conflict with");

    let (status, body) = login_as(&app, "op@example.com", "browser-b").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "pending");
    assert!(body["attemptId"].is_string());

    // The original browser's session is untouched until someone approves.
    let active = ctx
        .state
        .sessions
        .get_active_session()
        .await
        .expect("session intact");
    assert_eq!(active.browser_id, "browser-a");
}
