use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::session::{NewSession, SessionPage},
    models::user::{User, UserResponse},
    state::AppState,
    utils::{jwt::create_access_token, password::verify_password},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub page: SessionPage,
    #[validate(length(min = 1))]
    pub browser_id: String,
    #[serde(default)]
    pub browser_info: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub session_id: String,
    pub user: UserResponse,
}

/// Password login. The primary path always evicts whatever session was
/// live (forced takeover); with the arbitration policy switch on, a
/// cross-browser conflict instead records a pending attempt for the active
/// operator to approve or deny.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let session_id = Uuid::new_v4().to_string();
    let new_session = NewSession {
        user_id: user.id.clone(),
        email: user.email.clone(),
        page: payload.page,
        session_id: session_id.clone(),
        browser_id: payload.browser_id.clone(),
    };

    if state.config.login_arbitration_enabled {
        let outcome = state.sessions.create_or_update_session(new_session, false).await;
        if outcome.conflict {
            let attempt = state
                .arbitration
                .create_login_attempt(
                    &user.id,
                    &user.email,
                    &payload.browser_id,
                    payload.browser_info.as_deref().unwrap_or(""),
                )
                .await?;
            let body = Json(json!({
                "status": "pending",
                "attemptId": attempt.id,
                "message": outcome.message,
            }));
            return Ok((StatusCode::CONFLICT, body).into_response());
        }
        if !outcome.success {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                outcome.message
            )));
        }
    } else {
        let outcome = state.sessions.create_or_update_session(new_session, true).await;
        if !outcome.success {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                outcome.message
            )));
        }
    }

    let token = create_access_token(
        user.id.clone(),
        user.email.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    let response = LoginResponse {
        token,
        session_id,
        user: UserResponse::from(user),
    };
    Ok(Json(response).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<Value> {
    state.sessions.clear_session(&user.id).await;
    Json(json!({"message": "Logged out"}))
}
