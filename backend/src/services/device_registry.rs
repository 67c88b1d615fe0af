//! Process-wide registry of display devices: presence, the per-device
//! command queue, and the optimistically tracked active image.
//!
//! Each device maps to one entry, so removing the entry drops its liveness
//! record, queued commands, and active-image state in a single step.
//! Garbage collection runs only as a side effect of heartbeat arrival;
//! there is no background sweeper.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::device::{ActiveImageInfo, DeviceStatus, RemoteCommand};

struct DeviceEntry {
    last_seen: DateTime<Utc>,
    queue: Vec<RemoteCommand>,
    active_image: Option<ActiveImageInfo>,
}

impl DeviceEntry {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_seen: now,
            queue: Vec::new(),
            active_image: None,
        }
    }
}

pub struct DeviceRegistry {
    stale_after: Duration,
    devices: DashMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            devices: DashMap::new(),
        }
    }

    /// One heartbeat call: GC pass, liveness upsert, active-image record,
    /// and an atomic drain of the device's queue. Commands not delivered in
    /// this response are gone; the queue is the slow-but-reliable fallback
    /// to the broadcast channel, not a durable log.
    pub fn heartbeat(
        &self,
        device_id: &str,
        active_image: Option<ActiveImageInfo>,
        now: DateTime<Utc>,
    ) -> Vec<RemoteCommand> {
        self.collect_garbage(now);

        let mut entry = self
            .devices
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceEntry::new(now));
        entry.last_seen = now;
        entry.active_image = active_image;
        std::mem::take(&mut entry.queue)
    }

    /// Append a command for a device, creating its queue if absent. The
    /// active-image record updates synchronously for `show-image` /
    /// `hide-image`, ahead of actual delivery, so status reads reflect
    /// operator intent without waiting for the next poll.
    pub fn enqueue_command(&self, device_id: &str, command: RemoteCommand, now: DateTime<Utc>) {
        let mut entry = self
            .devices
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceEntry::new(now));

        match &command {
            RemoteCommand::ShowImage { name, url } => {
                entry.active_image = Some(ActiveImageInfo {
                    name: name.clone(),
                    url: url.clone(),
                });
            }
            RemoteCommand::HideImage => entry.active_image = None,
            _ => {}
        }

        tracing::debug!(device_id, command = command.kind(), "queued command");
        entry.queue.push(command);
    }

    /// Read-only liveness + state check. A device is valid while its last
    /// heartbeat is within the staleness window.
    pub fn verify_device(&self, device_id: &str, now: DateTime<Utc>) -> Option<DeviceStatus> {
        let entry = self.devices.get(device_id)?;
        if now.signed_duration_since(entry.last_seen) > self.stale_after {
            return None;
        }
        Some(DeviceStatus::new(
            device_id.to_string(),
            entry.last_seen,
            entry.active_image.clone(),
        ))
    }

    /// Every non-stale device, for the controller's target picker.
    pub fn live_devices(&self, now: DateTime<Utc>) -> Vec<DeviceStatus> {
        let mut devices: Vec<DeviceStatus> = self
            .devices
            .iter()
            .filter(|entry| now.signed_duration_since(entry.last_seen) <= self.stale_after)
            .map(|entry| {
                DeviceStatus::new(
                    entry.key().clone(),
                    entry.last_seen,
                    entry.active_image.clone(),
                )
            })
            .collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        devices
    }

    /// Drop devices whose last heartbeat predates the staleness window,
    /// cascading their queue and active-image state. Returns how many were
    /// removed.
    pub fn collect_garbage(&self, now: DateTime<Utc>) -> usize {
        let before = self.devices.len();
        self.devices
            .retain(|_, entry| now.signed_duration_since(entry.last_seen) <= self.stale_after);
        let removed = before - self.devices.len();
        if removed > 0 {
            tracing::debug!(removed, "garbage collected stale devices");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_preserves_fifo_order() {
        let registry = DeviceRegistry::new(Duration::seconds(15));
        let now = Utc::now();
        registry.enqueue_command("tv", RemoteCommand::Next, now);
        registry.enqueue_command("tv", RemoteCommand::TogglePause, now);
        registry.enqueue_command("tv", RemoteCommand::Previous, now);

        let drained = registry.heartbeat("tv", None, now);
        assert_eq!(
            drained,
            vec![
                RemoteCommand::Next,
                RemoteCommand::TogglePause,
                RemoteCommand::Previous
            ]
        );
    }
}
