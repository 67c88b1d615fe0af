use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    models::session::{NewSession, SessionPage},
    models::user::User,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheckRequest {
    pub page: SessionPage,
    #[validate(length(min = 1))]
    pub session_id: String,
    #[validate(length(min = 1))]
    pub browser_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheckResponse {
    pub success: bool,
    pub user_id: String,
    pub email: String,
    pub page: SessionPage,
}

/// Called on every admin/remote page load and every 15 s after. An exact
/// triple match refreshes liveness; a different browser holding the session
/// gets the `concurrent_session` 403 and the client logs itself out.
pub async fn check_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<SessionCheckRequest>,
) -> Result<Json<SessionCheckResponse>, AppError> {
    payload.validate()?;

    // Sessions that stopped heartbeating are swept opportunistically here.
    state.sessions.cleanup_stale_sessions(Utc::now()).await;

    let outcome = state
        .sessions
        .create_or_update_session(
            NewSession {
                user_id: user.id.clone(),
                email: user.email.clone(),
                page: payload.page,
                session_id: payload.session_id.clone(),
                browser_id: payload.browser_id.clone(),
            },
            false,
        )
        .await;

    if outcome.conflict {
        let (active_user, active_page) = outcome
            .existing_session
            .map(|s| (s.email, s.page.to_string()))
            .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()));
        return Err(AppError::ConcurrentSession {
            message: outcome.message,
            active_user,
            active_page,
        });
    }
    if !outcome.success {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            outcome.message
        )));
    }

    Ok(Json(SessionCheckResponse {
        success: true,
        user_id: user.id,
        email: user.email,
        page: payload.page,
    }))
}

/// Liveness touch from an open operator page, every 60 s.
pub async fn session_heartbeat(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<Value> {
    let touched = state.sessions.update_last_seen(&user.id).await;
    Json(json!({"success": touched}))
}
