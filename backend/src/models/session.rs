//! Models for the single globally-active operator session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Which operator surface a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionPage {
    Admin,
    Remote,
}

impl SessionPage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPage::Admin => "admin",
            SessionPage::Remote => "remote",
        }
    }
}

impl fmt::Display for SessionPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SessionPage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(SessionPage::Admin),
            "remote" => Ok(SessionPage::Remote),
            other => Err(format!("unknown session page: {}", other)),
        }
    }
}

/// Store representation of the active operator session. The system keeps at
/// most one operator context alive at a time; `session_id` is unique per
/// login, `browser_id` is the stable per-browser fingerprint used for
/// conflict detection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub page: SessionPage,
    pub session_id: String,
    pub browser_id: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Input for a session create/refresh call, before the row identity exists.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub email: String,
    pub page: SessionPage,
    pub session_id: String,
    pub browser_id: String,
}

impl NewSession {
    /// Materialize a store row, stamping identity and both timestamps.
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            email: self.email,
            page: self.page,
            session_id: self.session_id,
            browser_id: self.browser_id,
            created_at: now,
            last_seen: now,
        }
    }
}
