use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware as app_middleware, state::AppState};

/// Compose the API surface: public device/auth endpoints, then the
/// operator endpoints behind bearer auth.
pub fn api_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/devices/heartbeat", post(handlers::devices::heartbeat))
        .route("/api/devices/verify", get(handlers::devices::verify_device))
        .route(
            "/api/login-attempts",
            post(handlers::login_attempts::create_attempt),
        )
        .route(
            "/api/login-attempts/status",
            get(handlers::login_attempts::attempt_status),
        );

    let operator_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/devices", get(handlers::devices::list_devices))
        .route("/api/remote/command", post(handlers::remote::dispatch_command))
        .route("/api/remote/notify", post(handlers::remote::notify))
        .route("/api/session/check", post(handlers::session::check_session))
        .route(
            "/api/session/heartbeat",
            post(handlers::session::session_heartbeat),
        )
        .route(
            "/api/login-attempts/respond",
            post(handlers::login_attempts::respond_attempt),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(operator_routes)
        .layer(axum_middleware::from_fn(
            app_middleware::request_id::request_id,
        ))
        .with_state(state)
}
