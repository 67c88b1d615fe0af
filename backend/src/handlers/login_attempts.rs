use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppError,
    models::login_attempt::{AttemptDecision, AttemptStatus},
    models::user::User,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub browser_id: String,
    #[serde(default)]
    pub browser_info: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<String>,
}

/// Entry point for a browser that just passed password auth but found a
/// session active elsewhere. `no_conflict` and `same_browser` mean the
/// caller may simply proceed with login; `pending` means poll for the
/// active operator's decision.
pub async fn create_attempt(
    State(state): State<AppState>,
    Json(payload): Json<CreateAttemptRequest>,
) -> Result<Json<CreateAttemptResponse>, AppError> {
    payload.validate()?;

    let response = match state.sessions.get_active_session().await {
        None => CreateAttemptResponse {
            status: "no_conflict".to_string(),
            attempt_id: None,
        },
        Some(active) if active.browser_id == payload.browser_id => CreateAttemptResponse {
            status: "same_browser".to_string(),
            attempt_id: None,
        },
        Some(_) => {
            let attempt = state
                .arbitration
                .create_login_attempt(
                    &payload.user_id,
                    &payload.email,
                    &payload.browser_id,
                    &payload.browser_info,
                )
                .await?;
            CreateAttemptResponse {
                status: "pending".to_string(),
                attempt_id: Some(attempt.id),
            }
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStatusQuery {
    pub attempt_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttemptStatusResponse {
    pub status: AttemptStatus,
    pub message: String,
}

/// Polled by the waiting browser every 2 s until a terminal status shows
/// up. Expiry is applied lazily during this check.
pub async fn attempt_status(
    State(state): State<AppState>,
    Query(query): Query<AttemptStatusQuery>,
) -> Result<Json<AttemptStatusResponse>, AppError> {
    let report = state
        .arbitration
        .check_attempt_status(&query.attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Login attempt not found".to_string()))?;

    Ok(Json(AttemptStatusResponse {
        status: report.status,
        message: report.message,
    }))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondAttemptRequest {
    #[validate(length(min = 1))]
    pub attempt_id: String,
    pub decision: AttemptDecision,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondAttemptResponse {
    pub success: bool,
    pub decision: AttemptDecision,
    pub message: String,
}

/// The active operator approves or denies a pending attempt.
pub async fn respond_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<RespondAttemptRequest>,
) -> Result<Json<RespondAttemptResponse>, AppError> {
    payload.validate()?;

    let outcome = state
        .arbitration
        .respond_to_attempt(&payload.attempt_id, payload.decision, &user.id)
        .await?;

    Ok(Json(RespondAttemptResponse {
        success: outcome.success,
        decision: outcome.decision,
        message: outcome.message,
    }))
}
