//! Realtime control channel: named broadcast topics carrying JSON events
//! between the remote controller, display clients, and server-side actors.
//!
//! Delivery is best-effort and at-most-once. Publish never surfaces an
//! error to the caller; a send failure only means nobody is listening, and
//! the heartbeat queue remains the reliable fallback path. A sender never
//! receives its own broadcast.

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Per-topic buffer. A subscriber that falls more than this many messages
/// behind skips ahead (lagged) rather than blocking senders.
const BROADCAST_CAPACITY: usize = 256;

pub const CHANNEL_REMOTE_CONTROL: &str = "remote-control";
pub const CHANNEL_STATUS: &str = "remote-control-status";
pub const CHANNEL_HEARTBEAT: &str = "remote-control-heartbeat";
pub const CHANNEL_NOTIFICATIONS: &str = "remote-control-notifications";

pub const EVENT_REMOTE_COMMAND: &str = "remote-command";
pub const EVENT_REQUEST_STATUS: &str = "request-status";
pub const EVENT_SLIDESHOW_STATUS: &str = "slideshow-status";
pub const EVENT_IMAGE_CLOSED: &str = "image-closed";
pub const EVENT_VIDEO_UPDATED: &str = "video-updated";
pub const EVENT_IMAGE_UPDATED: &str = "image-updated";
pub const EVENT_FORCE_REFRESH: &str = "force-refresh";

#[derive(Debug, Clone)]
struct Envelope {
    sender: Uuid,
    event: String,
    payload: Value,
}

/// An event as seen by a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub event: String,
    pub payload: Value,
}

#[derive(Default)]
pub struct ControlChannel {
    topics: DashMap<String, broadcast::Sender<Envelope>>,
}

impl ControlChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<Envelope> {
        self.topics
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .clone()
    }

    /// Join a logical channel. Dropping the subscription leaves it; teardown
    /// is always safe, including mid-connect.
    pub fn subscribe(&self, channel: &str) -> ChannelSubscription {
        let tx = self.sender_for(channel);
        let rx = tx.subscribe();
        ChannelSubscription {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            tx,
            rx,
        }
    }

    /// Publish without a subscription handle. Used by server-side actors
    /// (command dispatch, admin-side cache-invalidation broadcasts).
    pub fn publish(&self, channel: &str, event: &str, payload: Value) {
        let tx = self.sender_for(channel);
        if tx
            .send(Envelope {
                sender: Uuid::new_v4(),
                event: event.to_string(),
                payload,
            })
            .is_err()
        {
            tracing::debug!(channel, event, "broadcast dropped, no subscribers");
        }
    }
}

pub struct ChannelSubscription {
    id: Uuid,
    channel: String,
    tx: broadcast::Sender<Envelope>,
    rx: broadcast::Receiver<Envelope>,
}

impl ChannelSubscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Publish to every other subscriber on this channel.
    pub fn publish(&self, event: &str, payload: Value) {
        if self
            .tx
            .send(Envelope {
                sender: self.id,
                event: event.to_string(),
                payload,
            })
            .is_err()
        {
            tracing::debug!(channel = %self.channel, event, "publish dropped, no subscribers");
        }
    }

    /// Next event from the channel, skipping this subscription's own
    /// broadcasts. Returns `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.rx.recv().await {
                Ok(env) if env.sender == self.id => continue,
                Ok(env) => {
                    return Some(ChannelEvent {
                        event: env.event,
                        payload: env.payload,
                    })
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        channel = %self.channel,
                        skipped,
                        "subscriber lagged; missed broadcasts dropped"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for a specific event, discarding others.
    pub async fn recv_event(&mut self, event: &str) -> Option<Value> {
        while let Some(received) = self.recv().await {
            if received.event == event {
                return Some(received.payload);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn broadcast_reaches_other_subscribers_but_not_self() {
        let channel = ControlChannel::new();
        let controller = channel.subscribe(CHANNEL_REMOTE_CONTROL);
        let mut display = channel.subscribe(CHANNEL_REMOTE_CONTROL);

        controller.publish(EVENT_REMOTE_COMMAND, json!({"command": "next"}));

        let event = display.recv().await.expect("display receives");
        assert_eq!(event.event, EVENT_REMOTE_COMMAND);
        assert_eq!(event.payload["command"], "next");
    }

    #[tokio::test]
    async fn sender_does_not_receive_own_publish() {
        let channel = ControlChannel::new();
        let mut controller = channel.subscribe(CHANNEL_STATUS);
        let display = channel.subscribe(CHANNEL_STATUS);

        controller.publish(EVENT_SLIDESHOW_STATUS, json!({"current": 1}));
        display.publish(EVENT_SLIDESHOW_STATUS, json!({"current": 2}));

        // The controller must see only the display's message.
        let event = controller.recv().await.expect("receive");
        assert_eq!(event.payload["current"], 2);
    }

    #[tokio::test]
    async fn channels_are_isolated_by_name() {
        let channel = ControlChannel::new();
        let mut status_sub = channel.subscribe(CHANNEL_STATUS);

        channel.publish(CHANNEL_REMOTE_CONTROL, EVENT_REMOTE_COMMAND, json!({}));
        channel.publish(CHANNEL_STATUS, EVENT_SLIDESHOW_STATUS, json!({"total": 3}));

        let event = status_sub.recv().await.expect("receive");
        assert_eq!(event.event, EVENT_SLIDESHOW_STATUS);
    }
}
