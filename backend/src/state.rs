use std::sync::Arc;

use chrono::Duration;

use crate::config::Config;
use crate::repositories::login_attempt::LoginAttemptStoreTrait;
use crate::repositories::session::SessionStoreTrait;
use crate::repositories::user::UserStoreTrait;
use crate::services::control_channel::ControlChannel;
use crate::services::device_registry::DeviceRegistry;
use crate::services::login_arbitration::LoginArbitration;
use crate::services::session_registry::SessionRegistry;

/// Long-lived service handles shared by every request handler. Constructed
/// once at process start and cloned into the router; the in-memory device
/// registry and control channel live exactly as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStoreTrait>,
    pub sessions: Arc<SessionRegistry>,
    pub arbitration: Arc<LoginArbitration>,
    pub devices: Arc<DeviceRegistry>,
    pub channel: Arc<ControlChannel>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStoreTrait>,
        session_store: Arc<dyn SessionStoreTrait>,
        attempt_store: Arc<dyn LoginAttemptStoreTrait>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            session_store,
            Duration::hours(config.session_stale_hours),
        ));
        let arbitration = Arc::new(LoginArbitration::new(
            attempt_store,
            sessions.clone(),
            Duration::seconds(config.login_attempt_ttl_seconds),
        ));
        let devices = Arc::new(DeviceRegistry::new(Duration::seconds(
            config.device_stale_seconds,
        )));
        let channel = Arc::new(ControlChannel::new());

        Self {
            config,
            users,
            sessions,
            arbitration,
            devices,
            channel,
        }
    }
}
