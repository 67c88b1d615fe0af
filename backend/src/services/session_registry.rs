//! Single-active-session policy.
//!
//! The deployment allows exactly one operator context to be live at a time,
//! across all users and pages, so that one physical operator controls the
//! displays. Password login always takes over (`force_new = true`); the
//! non-forced path detects cross-browser conflicts and hands them to login
//! arbitration.
//!
//! Store failures degrade to "no session" on read paths, but conflict
//! detection fails closed: ambiguous state rejects the login rather than
//! risking two live controllers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::models::session::{NewSession, Session};
use crate::repositories::session::SessionStoreTrait;

/// Result of a create/refresh call.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub success: bool,
    pub conflict: bool,
    pub message: String,
    /// The conflicting session, attached when `conflict` is set.
    pub existing_session: Option<Session>,
}

impl SessionOutcome {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            conflict: false,
            message: message.to_string(),
            existing_session: None,
        }
    }

    fn conflict(existing: Session) -> Self {
        Self {
            success: false,
            conflict: true,
            message: format!(
                "Another session is active on {} for {}",
                existing.page, existing.email
            ),
            existing_session: Some(existing),
        }
    }

    fn unavailable() -> Self {
        Self {
            success: false,
            conflict: false,
            message: "Unable to verify active session".to_string(),
            existing_session: None,
        }
    }
}

pub struct SessionRegistry {
    store: Arc<dyn SessionStoreTrait>,
    stale_after: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SessionStoreTrait>, stale_after: Duration) -> Self {
        Self { store, stale_after }
    }

    /// The single current session, or `None`. With multiple rows from the
    /// same browser (admin + remote tab) the most recently seen one wins.
    pub async fn get_active_session(&self) -> Option<Session> {
        match self.store.all_sessions().await {
            Ok(rows) => rows.into_iter().next(),
            Err(err) => {
                tracing::warn!(error = ?err, "session store read failed; treating as no session");
                None
            }
        }
    }

    pub async fn create_or_update_session(
        &self,
        new: NewSession,
        force_new: bool,
    ) -> SessionOutcome {
        let now = Utc::now();

        // An exact (user, page, session_id) match is a liveness re-poll from
        // the same login, not a new one.
        match self
            .store
            .find_exact(&new.user_id, new.page, &new.session_id)
            .await
        {
            Ok(Some(_)) => {
                if let Err(err) = self
                    .store
                    .touch_exact(&new.user_id, new.page, &new.session_id, now)
                    .await
                {
                    tracing::warn!(error = ?err, user_id = %new.user_id, "failed to refresh session last_seen");
                }
                return SessionOutcome::ok("Session refreshed");
            }
            Ok(None) => {}
            Err(err) if force_new => {
                // The forced path replaces everything anyway.
                tracing::warn!(error = ?err, "session lookup failed; continuing with forced takeover");
            }
            Err(err) => {
                tracing::warn!(error = ?err, "session lookup failed; rejecting non-forced login");
                return SessionOutcome::unavailable();
            }
        }

        let session = new.into_session(now);

        if force_new {
            return match self.store.replace_all(&session).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %session.user_id,
                        page = %session.page,
                        browser_id = %session.browser_id,
                        "forced session takeover"
                    );
                    SessionOutcome::ok("Session created")
                }
                Err(err) => {
                    tracing::error!(error = ?err, "failed to store session on forced takeover");
                    SessionOutcome::unavailable()
                }
            };
        }

        // Conflict detection fails closed: without a trustworthy view of the
        // session table we reject rather than risk a second controller.
        let existing = match self.store.all_sessions().await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = ?err, "session scan failed during conflict detection");
                return SessionOutcome::unavailable();
            }
        };

        if let Some(conflicting) = existing
            .iter()
            .find(|s| s.browser_id != session.browser_id)
        {
            return SessionOutcome::conflict(conflicting.clone());
        }

        // Same browser, different tab/page: evict whatever this user had on
        // this page and insert the new row.
        match self.store.replace_for_page(&session).await {
            Ok(()) => SessionOutcome::ok("Session created"),
            Err(err) => {
                tracing::error!(error = ?err, "failed to store session");
                SessionOutcome::unavailable()
            }
        }
    }

    /// Periodic liveness touch from an open operator page.
    pub async fn update_last_seen(&self, user_id: &str) -> bool {
        match self.store.touch_user(user_id, Utc::now()).await {
            Ok(touched) => touched > 0,
            Err(err) => {
                tracing::warn!(error = ?err, user_id, "failed to touch session last_seen");
                false
            }
        }
    }

    /// Logout (or arbitration approval) path.
    pub async fn clear_session(&self, user_id: &str) -> u64 {
        match self.store.delete_for_user(user_id).await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(user_id, removed, "cleared operator session");
                }
                removed
            }
            Err(err) => {
                tracing::warn!(error = ?err, user_id, "failed to clear session");
                0
            }
        }
    }

    /// Admin override / recovery.
    pub async fn clear_all_sessions(&self) -> u64 {
        match self.store.delete_all().await {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(error = ?err, "failed to clear sessions");
                0
            }
        }
    }

    /// Delete sessions whose last heartbeat predates the staleness window.
    pub async fn cleanup_stale_sessions(&self, now: DateTime<Utc>) -> u64 {
        let cutoff = now - self.stale_after;
        match self.store.delete_stale(cutoff).await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(removed, "swept stale operator sessions");
                }
                removed
            }
            Err(err) => {
                tracing::warn!(error = ?err, "stale session sweep failed");
                0
            }
        }
    }
}
