use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    models::channel::encode_remote_command,
    models::device::RemoteCommand,
    models::user::User,
    services::control_channel::{
        CHANNEL_REMOTE_CONTROL, EVENT_FORCE_REFRESH, EVENT_IMAGE_UPDATED, EVENT_REMOTE_COMMAND,
        EVENT_VIDEO_UPDATED,
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCommandRequest {
    #[validate(length(min = 1))]
    pub target_device_id: String,
    pub command: RemoteCommand,
}

/// Fire-and-forget command dispatch. The command goes out on both paths:
/// the broadcast reaches connected displays near-instantly, the per-device
/// queue covers displays that only poll. Displays treat duplicate delivery
/// as a harmless re-apply, so nothing deduplicates here.
pub async fn dispatch_command(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<DispatchCommandRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate()?;

    let now = Utc::now();
    state
        .devices
        .enqueue_command(&payload.target_device_id, payload.command.clone(), now);
    state.channel.publish(
        CHANNEL_REMOTE_CONTROL,
        EVENT_REMOTE_COMMAND,
        encode_remote_command(&payload.command, now),
    );

    tracing::info!(
        operator = %user.email,
        target = %payload.target_device_id,
        command = payload.command.kind(),
        "dispatched remote command"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "Command queued"})),
    ))
}

/// Admin-side content mutations display clients must react to. These are
/// cache-invalidation hints: displays re-fetch their slide list rather
/// than receiving content here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ContentEvent {
    VideoUpdated,
    ImageUpdated,
    ForceRefresh,
}

impl ContentEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ContentEvent::VideoUpdated => EVENT_VIDEO_UPDATED,
            ContentEvent::ImageUpdated => EVENT_IMAGE_UPDATED,
            ContentEvent::ForceRefresh => EVENT_FORCE_REFRESH,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotifyRequest {
    pub event: ContentEvent,
}

pub async fn notify(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NotifyRequest>,
) -> (StatusCode, Json<Value>) {
    state.channel.publish(
        CHANNEL_REMOTE_CONTROL,
        payload.event.event_name(),
        json!({"timestamp": Utc::now().timestamp_millis()}),
    );

    tracing::info!(operator = %user.email, event = payload.event.event_name(), "content broadcast");

    (
        StatusCode::ACCEPTED,
        Json(json!({"message": "Broadcast sent"})),
    )
}
