//! Payload shapes exchanged over the realtime control channel.
//!
//! On the channel a remote command travels as `{command, data, timestamp}`
//! (the command name under `command`), while the queue/API shape is
//! `{type, data}`. The encode/decode helpers translate between the two so
//! the enum is defined once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use crate::models::device::RemoteCommand;

/// Controller → display: ask for a fresh status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusRequest {
    /// Unix epoch milliseconds at send time.
    pub timestamp: i64,
}

impl StatusRequest {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now.timestamp_millis(),
        }
    }
}

/// Display → controller: local playback state, sent on request and
/// opportunistically on every local change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlideshowStatus {
    pub total: usize,
    pub current: usize,
    pub current_image: Option<String>,
    pub paused: bool,
}

/// Encode a command for the channel: `{"command": name, "data": ..., "timestamp": ms}`.
pub fn encode_remote_command(command: &RemoteCommand, now: DateTime<Utc>) -> Value {
    let mut obj = match serde_json::to_value(command) {
        Ok(Value::Object(map)) => map,
        // The enum always serializes to an object; treat anything else as a
        // bare command with no payload.
        _ => Map::new(),
    };
    let data = obj.remove("data").unwrap_or(Value::Null);
    json!({
        "command": command.kind(),
        "data": data,
        "timestamp": now.timestamp_millis(),
    })
}

/// Decode a channel payload back into a command. Returns `None` for
/// malformed or unknown payloads; the channel is best-effort, so callers
/// drop these rather than erroring.
pub fn decode_remote_command(payload: &Value) -> Option<RemoteCommand> {
    let name = payload.get("command")?.as_str()?;
    let mut wire = Map::new();
    wire.insert("type".to_string(), Value::String(name.to_string()));
    if let Some(data) = payload.get("data") {
        if !data.is_null() {
            wire.insert("data".to_string(), data.clone());
        }
    }
    serde_json::from_value(Value::Object(wire)).ok()
}
