//! Login, session check, and takeover flows through the HTTP surface.

use axum::http::StatusCode;
use serde_json::json;

mod support;

use support::{bearer_token_for, post_json, seed_user, test_context, test_router, TestContext};

async fn login(
    app: &axum::Router,
    email: &str,
    password: &str,
    browser_id: &str,
) -> (StatusCode, serde_json::Value) {
    post_json(
        app,
        "/api/auth/login",
        None,
        json!({
            "email": email,
            "password": password,
            "page": "remote",
            "browserId": browser_id,
        }),
    )
    .await
}

async fn check_session(
    app: &axum::Router,
    token: &str,
    session_id: &str,
    browser_id: &str,
) -> (StatusCode, serde_json::Value) {
    post_json(
        app,
        "/api/session/check",
        Some(token),
        json!({
            "page": "remote",
            "sessionId": session_id,
            "browserId": browser_id,
        }),
    )
    .await
}

async fn seeded(ctx: &TestContext) -> signcast_backend::models::user::User {
    seed_user(ctx, "op@example.com", "hunter2").await
}

#[tokio::test]
async fn login_issues_token_and_session() {
    let ctx = test_context();
    let app = test_router(&ctx);
    seeded(&ctx).await;

    let (status, body) = login(&app, "op@example.com", "hunter2", "browser-a").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert!(body["sessionId"].is_string());
    assert_eq!(body["user"]["email"], "op@example.com");

    let active = ctx
        .state
        .sessions
        .get_active_session()
        .await
        .expect("session created");
    assert_eq!(active.browser_id, "browser-a");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let ctx = test_context();
    let app = test_router(&ctx);
    seeded(&ctx).await;

    let (status, body) = login(&app, "op@example.com", "wrong", "browser-a").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = login(&app, "nobody@example.com", "hunter2", "browser-a").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_check_refreshes_own_session() {
    let ctx = test_context();
    let app = test_router(&ctx);
    seeded(&ctx).await;

    let (_, body) = login(&app, "op@example.com", "hunter2", "browser-a").await;
    let token = body["token"].as_str().expect("token").to_string();
    let session_id = body["sessionId"].as_str().expect("session id").to_string();

    let (status, body) = check_session(&app, &token, &session_id, "browser-a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["email"], "op@example.com");
    assert_eq!(body["page"], "remote");
}

#[tokio::test]
async fn conflicting_browser_is_forced_out_with_marker() {
    let ctx = test_context();
    let app = test_router(&ctx);
    seeded(&ctx).await;

    // Browser A logs in and holds the session.
    let (_, body_a) = login(&app, "op@example.com", "hunter2", "browser-a").await;
    let token_a = body_a["token"].as_str().expect("token").to_string();

    // Browser B takes over via the default forced-login path.
    let (status, body_b) = login(&app, "op@example.com", "hunter2", "browser-b").await;
    assert_eq!(status, StatusCode::OK);
    let session_b = body_b["sessionId"].as_str().expect("session id");

    let rows = {
        use signcast_backend::repositories::SessionStoreTrait;
        ctx.sessions.all_sessions().await.expect("list sessions")
    };
    assert_eq!(rows.len(), 1, "takeover leaves a single session");
    assert_eq!(rows[0].session_id, session_b);

    // Browser A's next periodic check hits the concurrent-session wall and
    // must log itself out.
    let session_a = body_a["sessionId"].as_str().expect("session id");
    let (status, body) = check_session(&app, &token_a, session_a, "browser-a").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "concurrent_session");
    assert_eq!(body["activeUser"], "op@example.com");
    assert_eq!(body["activePage"], "remote");
}

#[tokio::test]
async fn session_heartbeat_touches_last_seen() {
    let ctx = test_context();
    let app = test_router(&ctx);
    let user = seeded(&ctx).await;
    let token = bearer_token_for(&user);

    // Without a session the heartbeat is a no-op.
    let (status, body) = post_json(&app, "/api/session/heartbeat", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    login(&app, "op@example.com", "hunter2", "browser-a").await;

    let (status, body) = post_json(&app, "/api/session/heartbeat", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn logout_clears_the_active_session() {
    let ctx = test_context();
    let app = test_router(&ctx);
    seeded(&ctx).await;

    let (_, body) = login(&app, "op@example.com", "hunter2", "browser-a").await;
    let token = body["token"].as_str().expect("token").to_string();

    let (status, _) = post_json(&app, "/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    assert!(ctx.state.sessions.get_active_session().await.is_none());
}

#[tokio::test]
async fn check_requires_auth() {
    let ctx = test_context();
    let app = test_router(&ctx);

    let (status, _) = post_json(
        &app,
        "/api/session/check",
        None,
        json!({"page": "remote", "sessionId": "s", "browserId": "b"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
