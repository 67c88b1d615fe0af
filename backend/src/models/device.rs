//! Display-device wire types: remote commands, presence, and the heartbeat
//! request/response contract shared by the server handler and the device
//! client loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// What a device is currently (or is about to be) showing. Updated
/// optimistically when a `show-image` command is queued, before the device
/// has polled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveImageInfo {
    pub name: String,
    pub url: String,
}

/// A unit of remote instruction. Serializes as `{"type": ..., "data": ...}`
/// with the payload keyed by type; unit commands omit `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum RemoteCommand {
    ShowImage { name: String, url: String },
    HideImage,
    Previous,
    Next,
    TogglePause,
    Goto { index: usize },
    Restart,
    Refresh,
    CloseOverlay,
}

impl RemoteCommand {
    /// Wire name of the command, for logging and channel payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteCommand::ShowImage { .. } => "show-image",
            RemoteCommand::HideImage => "hide-image",
            RemoteCommand::Previous => "previous",
            RemoteCommand::Next => "next",
            RemoteCommand::TogglePause => "toggle-pause",
            RemoteCommand::Goto { .. } => "goto",
            RemoteCommand::Restart => "restart",
            RemoteCommand::Refresh => "refresh",
            RemoteCommand::CloseOverlay => "close-overlay",
        }
    }
}

/// Liveness + displayed-item snapshot for one device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub device_id: String,
    /// Unix epoch milliseconds of the last heartbeat.
    pub last_seen: i64,
    pub active_image: Option<ActiveImageInfo>,
}

impl DeviceStatus {
    pub fn new(
        device_id: String,
        last_seen: DateTime<Utc>,
        active_image: Option<ActiveImageInfo>,
    ) -> Self {
        Self {
            device_id,
            last_seen: last_seen.timestamp_millis(),
            active_image,
        }
    }
}

/// Heartbeat body posted by a device every 3 seconds.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    #[validate(length(min = 1))]
    pub device_id: String,
    pub active_image: Option<ActiveImageInfo>,
}

/// Heartbeat response: the device's drained command queue, FIFO order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HeartbeatResponse {
    pub commands: Vec<RemoteCommand>,
}

/// Read-only liveness check used before targeting a device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDeviceResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_image: Option<ActiveImageInfo>,
}
