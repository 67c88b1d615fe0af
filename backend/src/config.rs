use std::env;

use anyhow::anyhow;

/// Database URL value that selects the in-memory stores instead of
/// PostgreSQL. Useful for local development without a database; sessions
/// and login attempts then do not survive a restart.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    /// Operator sessions with no heartbeat for this long are swept.
    pub session_stale_hours: i64,
    /// Display devices silent for this long are garbage collected.
    pub device_stale_seconds: i64,
    /// How long a cross-browser login attempt stays answerable.
    pub login_attempt_ttl_seconds: i64,
    /// Policy switch: route conflicting logins through the arbitration flow
    /// instead of unconditional forced takeover.
    pub login_arbitration_enabled: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/signcast".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        let jwt_expiration_hours = parse_env("JWT_EXPIRATION_HOURS", 12)?;
        let session_stale_hours = parse_env("SESSION_STALE_HOURS", 24)?;
        let device_stale_seconds = parse_env("DEVICE_STALE_SECONDS", 15)?;
        let login_attempt_ttl_seconds = parse_env("LOGIN_ATTEMPT_TTL_SECONDS", 120)?;

        let login_arbitration_enabled = env::var("LOGIN_ARBITRATION_ENABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            listen_addr,
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            session_stale_hours,
            device_stale_seconds,
            login_attempt_ttl_seconds,
            login_arbitration_enabled,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
