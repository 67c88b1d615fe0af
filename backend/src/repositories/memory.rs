//! In-memory store implementations. The record store is an external
//! collaborator behind the store traits, so deployments without a database
//! (and the test suite) can run against these; rows do not survive a
//! restart.
//!
//! The session table is a single mutex-guarded vector: every composite
//! operation holds the lock for its whole read-modify-write, which gives
//! the same no-two-racing-inserts guarantee the Postgres store gets from a
//! transaction.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::models::login_attempt::{AttemptStatus, LoginAttempt};
use crate::models::session::{Session, SessionPage};
use crate::models::user::User;
use crate::repositories::login_attempt::LoginAttemptStoreTrait;
use crate::repositories::session::SessionStoreTrait;
use crate::repositories::user::UserStoreTrait;

#[derive(Default)]
pub struct MemorySessionStore {
    rows: Mutex<Vec<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Session>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionStoreTrait for MemorySessionStore {
    async fn all_sessions(&self) -> anyhow::Result<Vec<Session>> {
        let mut rows = self.lock().clone();
        rows.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(rows)
    }

    async fn find_exact(
        &self,
        user_id: &str,
        page: SessionPage,
        session_id: &str,
    ) -> anyhow::Result<Option<Session>> {
        Ok(self
            .lock()
            .iter()
            .find(|s| s.user_id == user_id && s.page == page && s.session_id == session_id)
            .cloned())
    }

    async fn touch_exact(
        &self,
        user_id: &str,
        page: SessionPage,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut rows = self.lock();
        let mut touched = false;
        for s in rows.iter_mut() {
            if s.user_id == user_id && s.page == page && s.session_id == session_id {
                s.last_seen = now;
                touched = true;
            }
        }
        Ok(touched)
    }

    async fn touch_user(&self, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut rows = self.lock();
        let mut touched = 0;
        for s in rows.iter_mut() {
            if s.user_id == user_id {
                s.last_seen = now;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn replace_all(&self, session: &Session) -> anyhow::Result<()> {
        let mut rows = self.lock();
        rows.clear();
        rows.push(session.clone());
        Ok(())
    }

    async fn replace_for_page(&self, session: &Session) -> anyhow::Result<()> {
        let mut rows = self.lock();
        rows.retain(|s| !(s.user_id == session.user_id && s.page == session.page));
        rows.push(session.clone());
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &str) -> anyhow::Result<u64> {
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|s| s.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let mut rows = self.lock();
        let removed = rows.len();
        rows.clear();
        Ok(removed as u64)
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|s| s.last_seen >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryLoginAttemptStore {
    rows: Mutex<HashMap<String, LoginAttempt>>,
}

impl MemoryLoginAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LoginAttempt>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LoginAttemptStoreTrait for MemoryLoginAttemptStore {
    async fn insert(&self, attempt: &LoginAttempt) -> anyhow::Result<()> {
        self.lock().insert(attempt.id.clone(), attempt.clone());
        Ok(())
    }

    async fn find(&self, attempt_id: &str) -> anyhow::Result<Option<LoginAttempt>> {
        Ok(self.lock().get(attempt_id).cloned())
    }

    async fn mark_expired(&self, attempt_id: &str, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut rows = self.lock();
        match rows.get_mut(attempt_id) {
            Some(attempt) if attempt.status == AttemptStatus::Pending => {
                attempt.status = AttemptStatus::Expired;
                attempt.responded_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn resolve(
        &self,
        attempt_id: &str,
        responding_user_id: &str,
        status: AttemptStatus,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<LoginAttempt>> {
        let mut rows = self.lock();
        match rows.get_mut(attempt_id) {
            Some(attempt)
                if attempt.status == AttemptStatus::Pending
                    && attempt.user_id == responding_user_id =>
            {
                attempt.status = status;
                attempt.responded_at = Some(now);
                Ok(Some(attempt.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStoreTrait for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        Ok(self.rows.get(id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone()))
    }

    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        self.rows.insert(user.id.clone(), user.clone());
        Ok(())
    }
}
