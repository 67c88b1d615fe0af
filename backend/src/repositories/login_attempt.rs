//! Durable store for cross-browser login attempts. Status transitions are
//! guarded in the UPDATE predicate so a terminal attempt can never be
//! rewritten, and only the attempt's owner can resolve it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::connection::DbPool;
use crate::models::login_attempt::{AttemptStatus, LoginAttempt};

#[async_trait]
pub trait LoginAttemptStoreTrait: Send + Sync {
    async fn insert(&self, attempt: &LoginAttempt) -> anyhow::Result<()>;

    async fn find(&self, attempt_id: &str) -> anyhow::Result<Option<LoginAttempt>>;

    /// Lazy expiry: pending → expired, guarded on still-pending. Returns
    /// whether the transition happened.
    async fn mark_expired(&self, attempt_id: &str, now: DateTime<Utc>) -> anyhow::Result<bool>;

    /// Operator decision: pending → approved/denied, guarded on owner and
    /// still-pending. Returns the updated row when the predicate matched.
    async fn resolve(
        &self,
        attempt_id: &str,
        responding_user_id: &str,
        status: AttemptStatus,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<LoginAttempt>>;
}

pub struct PgLoginAttemptStore {
    pool: DbPool,
}

impl PgLoginAttemptStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const ATTEMPT_COLUMNS: &str =
    "id, user_id, email, browser_id, browser_info, status, created_at, responded_at, expires_at";

#[async_trait]
impl LoginAttemptStoreTrait for PgLoginAttemptStore {
    async fn insert(&self, attempt: &LoginAttempt) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO login_attempts \
             (id, user_id, email, browser_id, browser_info, status, created_at, responded_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&attempt.id)
        .bind(&attempt.user_id)
        .bind(&attempt.email)
        .bind(&attempt.browser_id)
        .bind(&attempt.browser_info)
        .bind(attempt.status.as_str())
        .bind(attempt.created_at)
        .bind(attempt.responded_at)
        .bind(attempt.expires_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, attempt_id: &str) -> anyhow::Result<Option<LoginAttempt>> {
        let row = sqlx::query_as::<_, LoginAttempt>(&format!(
            "SELECT {} FROM login_attempts WHERE id = $1",
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_expired(&self, attempt_id: &str, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE login_attempts SET status = 'expired', responded_at = $1 \
             WHERE id = $2 AND status = 'pending'",
        )
        .bind(now)
        .bind(attempt_id)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn resolve(
        &self,
        attempt_id: &str,
        responding_user_id: &str,
        status: AttemptStatus,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<LoginAttempt>> {
        let row = sqlx::query_as::<_, LoginAttempt>(&format!(
            "UPDATE login_attempts SET status = $1, responded_at = $2 \
             WHERE id = $3 AND user_id = $4 AND status = 'pending' \
             RETURNING {}",
            ATTEMPT_COLUMNS
        ))
        .bind(status.as_str())
        .bind(now)
        .bind(attempt_id)
        .bind(responding_user_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row)
    }
}
