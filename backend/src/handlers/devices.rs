use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::AppError,
    models::device::{DeviceStatus, HeartbeatRequest, HeartbeatResponse, VerifyDeviceResponse},
    state::AppState,
};

/// Device liveness ping, every 3 s per device. One call garbage collects
/// stale devices, refreshes this device's presence, records what it is
/// showing, and drains its queued commands.
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(payload): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, AppError> {
    payload.validate()?;

    let commands = state
        .devices
        .heartbeat(&payload.device_id, payload.active_image, Utc::now());

    Ok(Json(HeartbeatResponse { commands }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDeviceQuery {
    pub device_id: String,
}

/// Read-only liveness check used before targeting a device with commands.
pub async fn verify_device(
    State(state): State<AppState>,
    Query(query): Query<VerifyDeviceQuery>,
) -> Json<VerifyDeviceResponse> {
    let response = match state.devices.verify_device(&query.device_id, Utc::now()) {
        Some(status) => VerifyDeviceResponse {
            valid: true,
            last_seen: Some(status.last_seen),
            active_image: status.active_image,
        },
        None => VerifyDeviceResponse {
            valid: false,
            last_seen: None,
            active_image: None,
        },
    };
    Json(response)
}

/// Every live display, for the remote controller's target picker.
pub async fn list_devices(State(state): State<AppState>) -> Json<Vec<DeviceStatus>> {
    Json(state.devices.live_devices(Utc::now()))
}
