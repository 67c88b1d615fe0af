//! Cross-browser login arbitration.
//!
//! When a login arrives from a browser other than the active session's, a
//! pending attempt is recorded and the active operator gets to approve or
//! deny it. Attempts expire lazily: there is no background sweeper, the
//! transition to `expired` happens when the attempt is next polled.
//!
//! This is a complete standalone subsystem; whether the login path uses it
//! (instead of unconditional forced takeover) is a call-site policy switch.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::models::login_attempt::{AttemptDecision, AttemptStatus, LoginAttempt};
use crate::repositories::login_attempt::LoginAttemptStoreTrait;
use crate::services::session_registry::SessionRegistry;

/// Status snapshot returned to the polling (waiting) browser.
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub status: AttemptStatus,
    pub message: String,
}

/// Result of the active operator's approve/deny action.
#[derive(Debug, Clone)]
pub struct RespondOutcome {
    pub success: bool,
    pub decision: AttemptDecision,
    pub message: String,
}

pub struct LoginArbitration {
    attempts: Arc<dyn LoginAttemptStoreTrait>,
    sessions: Arc<SessionRegistry>,
    ttl: Duration,
}

impl LoginArbitration {
    pub fn new(
        attempts: Arc<dyn LoginAttemptStoreTrait>,
        sessions: Arc<SessionRegistry>,
        ttl: Duration,
    ) -> Self {
        Self {
            attempts,
            sessions,
            ttl,
        }
    }

    /// Record a pending attempt. Callers invoke this only after observing an
    /// active session with a different `browser_id`.
    pub async fn create_login_attempt(
        &self,
        user_id: &str,
        email: &str,
        browser_id: &str,
        browser_info: &str,
    ) -> anyhow::Result<LoginAttempt> {
        let attempt = LoginAttempt::new(
            user_id.to_string(),
            email.to_string(),
            browser_id.to_string(),
            browser_info.to_string(),
            Utc::now(),
            self.ttl,
        );
        self.attempts.insert(&attempt).await?;
        tracing::info!(
            attempt_id = %attempt.id,
            user_id,
            browser_id,
            "recorded cross-browser login attempt"
        );
        Ok(attempt)
    }

    /// Poll an attempt's status, applying lazy expiry as a side effect.
    pub async fn check_attempt_status(
        &self,
        attempt_id: &str,
    ) -> anyhow::Result<Option<AttemptReport>> {
        let Some(mut attempt) = self.attempts.find(attempt_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if attempt.is_expired(now) {
            if self.attempts.mark_expired(attempt_id, now).await? {
                attempt.status = AttemptStatus::Expired;
                attempt.responded_at = Some(now);
            } else if let Some(latest) = self.attempts.find(attempt_id).await? {
                // A response won the race against expiry; report what stuck.
                attempt = latest;
            }
        }

        Ok(Some(AttemptReport {
            message: status_message(attempt.status).to_string(),
            status: attempt.status,
        }))
    }

    /// Approve or deny a pending attempt. The update predicate enforces
    /// that only the owner of the active session resolves it; approval
    /// evicts that session so the waiting browser's retry succeeds.
    pub async fn respond_to_attempt(
        &self,
        attempt_id: &str,
        decision: AttemptDecision,
        responding_user_id: &str,
    ) -> anyhow::Result<RespondOutcome> {
        let now = Utc::now();
        let resolved = self
            .attempts
            .resolve(
                attempt_id,
                responding_user_id,
                decision.resolved_status(),
                now,
            )
            .await?;

        if let Some(attempt) = resolved {
            if decision == AttemptDecision::Approve {
                self.sessions.clear_session(&attempt.user_id).await;
                tracing::info!(
                    attempt_id,
                    user_id = %attempt.user_id,
                    "login attempt approved; active session cleared"
                );
            } else {
                tracing::info!(attempt_id, "login attempt denied; active session kept");
            }
            let message = match decision {
                AttemptDecision::Approve => "Login approved; the new browser may sign in",
                AttemptDecision::Deny => "Login denied; the active session remains",
            };
            return Ok(RespondOutcome {
                success: true,
                decision,
                message: message.to_string(),
            });
        }

        // Nothing matched: unknown id, already resolved, or wrong responder.
        let message = match self.attempts.find(attempt_id).await? {
            None => "Login attempt not found",
            Some(a) if a.status.is_terminal() => "Login attempt already resolved",
            Some(_) => "Only the active session's operator may respond",
        };
        Ok(RespondOutcome {
            success: false,
            decision,
            message: message.to_string(),
        })
    }
}

fn status_message(status: AttemptStatus) -> &'static str {
    match status {
        AttemptStatus::Pending => "Waiting for the active operator to respond",
        AttemptStatus::Approved => "Login approved; retry sign-in",
        AttemptStatus::Denied => "Login denied by the active operator",
        AttemptStatus::Expired => "Login attempt expired",
    }
}
