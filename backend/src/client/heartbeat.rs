//! Device-side heartbeat loop.
//!
//! Embedded TV browsers cannot always hold a socket open, so the display
//! client reports liveness and drains its command queue over plain HTTP on
//! a fixed interval. The first beat fires immediately on startup; failures
//! are logged and swallowed, the next tick simply retries.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::models::device::{ActiveImageInfo, HeartbeatRequest, HeartbeatResponse, RemoteCommand};

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);

pub struct HeartbeatClient {
    http: reqwest::Client,
    base_url: String,
    device_id: String,
    interval: Duration,
}

impl HeartbeatClient {
    pub fn new(base_url: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            device_id: device_id.into(),
            interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Beat until the command consumer goes away. Drained commands are
    /// forwarded in FIFO order; `active_image` is read fresh on every beat
    /// so the server sees what the display is currently showing.
    pub async fn run(
        self,
        commands: mpsc::Sender<RemoteCommand>,
        active_image: watch::Receiver<Option<ActiveImageInfo>>,
    ) {
        let url = format!("{}/api/devices/heartbeat", self.base_url);
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            ticker.tick().await;

            let body = HeartbeatRequest {
                device_id: self.device_id.clone(),
                active_image: active_image.borrow().clone(),
            };

            let drained = match self.beat(&url, &body).await {
                Ok(drained) => drained,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        device_id = %self.device_id,
                        "heartbeat failed; retrying next tick"
                    );
                    continue;
                }
            };

            for command in drained {
                if commands.send(command).await.is_err() {
                    tracing::debug!(
                        device_id = %self.device_id,
                        "command consumer gone; stopping heartbeat loop"
                    );
                    return;
                }
            }
        }
    }

    async fn beat(&self, url: &str, body: &HeartbeatRequest) -> anyhow::Result<Vec<RemoteCommand>> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: HeartbeatResponse = response.json().await?;
        Ok(parsed.commands)
    }
}
