//! Models for pending cross-browser login takeover requests.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Pending,
    Approved,
    Denied,
    Expired,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Approved => "approved",
            AttemptStatus::Denied => "denied",
            AttemptStatus::Expired => "expired",
        }
    }

    /// Terminal statuses are immutable; only `pending` can transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::Pending)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AttemptStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(AttemptStatus::Pending),
            "approved" => Ok(AttemptStatus::Approved),
            "denied" => Ok(AttemptStatus::Denied),
            "expired" => Ok(AttemptStatus::Expired),
            other => Err(format!("unknown attempt status: {}", other)),
        }
    }
}

/// The decision the active operator takes on a pending attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttemptDecision {
    Approve,
    Deny,
}

impl AttemptDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptDecision::Approve => "approve",
            AttemptDecision::Deny => "deny",
        }
    }

    pub fn resolved_status(&self) -> AttemptStatus {
        match self {
            AttemptDecision::Approve => AttemptStatus::Approved,
            AttemptDecision::Deny => AttemptStatus::Denied,
        }
    }
}

/// A login attempted from a browser other than the active session's.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoginAttempt {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub browser_id: String,
    /// Raw user-agent string, kept for the approval prompt.
    pub browser_info: String,
    #[sqlx(try_from = "String")]
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl LoginAttempt {
    pub fn new(
        user_id: String,
        email: String,
        browser_id: String,
        browser_info: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            email,
            browser_id,
            browser_info,
            status: AttemptStatus::Pending,
            created_at: now,
            responded_at: None,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == AttemptStatus::Pending && now > self.expires_at
    }
}
