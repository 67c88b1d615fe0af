//! Durable store for the single-active-session table.
//!
//! The store is deliberately dumb: it moves rows. The single-session policy
//! (conflict detection, forced takeover, refresh-vs-create) lives in
//! `services::session_registry`. The composite `replace_*` operations run
//! inside one transaction so two racing logins cannot both observe "no
//! active session" and both insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::connection::DbPool;
use crate::models::session::{Session, SessionPage};

#[async_trait]
pub trait SessionStoreTrait: Send + Sync {
    /// Every session row in the system, most recently seen first.
    async fn all_sessions(&self) -> anyhow::Result<Vec<Session>>;

    /// The row matching an exact `(user_id, page, session_id)` login triple.
    async fn find_exact(
        &self,
        user_id: &str,
        page: SessionPage,
        session_id: &str,
    ) -> anyhow::Result<Option<Session>>;

    /// Refresh `last_seen` on an exact triple. Returns whether a row matched.
    async fn touch_exact(
        &self,
        user_id: &str,
        page: SessionPage,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Refresh `last_seen` on every row for a user. Returns rows touched.
    async fn touch_user(&self, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<u64>;

    /// Forced takeover: delete every row system-wide and insert `session`,
    /// atomically.
    async fn replace_all(&self, session: &Session) -> anyhow::Result<()>;

    /// Delete rows for the same `(user_id, page)` and insert `session`,
    /// atomically. Used on the non-forced path once conflict detection has
    /// passed.
    async fn replace_for_page(&self, session: &Session) -> anyhow::Result<()>;

    async fn delete_for_user(&self, user_id: &str) -> anyhow::Result<u64>;

    async fn delete_all(&self) -> anyhow::Result<u64>;

    /// Staleness sweep: delete rows with `last_seen` older than `cutoff`.
    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64>;
}

pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, email, page, session_id, browser_id, created_at, last_seen";

#[async_trait]
impl SessionStoreTrait for PgSessionStore {
    async fn all_sessions(&self) -> anyhow::Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, Session>(&format!(
            "SELECT {} FROM operator_sessions ORDER BY last_seen DESC, created_at DESC",
            SESSION_COLUMNS
        ))
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_exact(
        &self,
        user_id: &str,
        page: SessionPage,
        session_id: &str,
    ) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query_as::<_, Session>(&format!(
            "SELECT {} FROM operator_sessions \
             WHERE user_id = $1 AND page = $2 AND session_id = $3",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(page.as_str())
        .bind(session_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row)
    }

    async fn touch_exact(
        &self,
        user_id: &str,
        page: SessionPage,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE operator_sessions SET last_seen = $1 \
             WHERE user_id = $2 AND page = $3 AND session_id = $4",
        )
        .bind(now)
        .bind(user_id)
        .bind(page.as_str())
        .bind(session_id)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_user(&self, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE operator_sessions SET last_seen = $1 WHERE user_id = $2")
            .bind(now)
            .bind(user_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn replace_all(&self, session: &Session) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM operator_sessions")
            .execute(&mut *tx)
            .await?;
        insert_session(&mut tx, session).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_for_page(&self, session: &Session) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM operator_sessions WHERE user_id = $1 AND page = $2")
            .bind(&session.user_id)
            .bind(session.page.as_str())
            .execute(&mut *tx)
            .await?;
        insert_session(&mut tx, session).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM operator_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM operator_sessions")
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM operator_sessions WHERE last_seen < $1")
            .bind(cutoff)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn insert_session(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    session: &Session,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO operator_sessions \
         (id, user_id, email, page, session_id, browser_id, created_at, last_seen) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.email)
    .bind(session.page.as_str())
    .bind(&session.session_id)
    .bind(&session.browser_id)
    .bind(session.created_at)
    .bind(session.last_seen)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
