//! Login attempt repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use domain::services::login_attempts::{evaluate, AttemptWindow, LOCKOUT_MINUTES};
use domain::services::{AttemptDecision, AttemptLimiter};
use domain::ReportError;
use sqlx::PgPool;

use crate::entities::LoginAttemptEntity;
use crate::metrics::QueryTimer;

/// Fixed-window attempt limiter shared by every server instance.
#[derive(Clone)]
pub struct PgAttemptLimiter {
    pool: PgPool,
}

impl PgAttemptLimiter {
    /// Creates a new PgAttemptLimiter with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find(&self, identifier: &str) -> Result<Option<AttemptWindow>, sqlx::Error> {
        let timer = QueryTimer::new("find_login_attempts");
        let result = sqlx::query_as::<_, LoginAttemptEntity>(
            r#"
            SELECT identifier, attempt_count, window_start
            FROM login_attempts
            WHERE identifier = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into))
    }

    async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("purge_login_attempts");
        let result = sqlx::query(
            r#"
            DELETE FROM login_attempts
            WHERE window_start <= NOW() - make_interval(mins => $1)
            "#,
        )
        .bind(LOCKOUT_MINUTES as i32)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    async fn record_attempt(&self, identifier: &str) -> Result<AttemptDecision, sqlx::Error> {
        let timer = QueryTimer::new("record_login_attempt");
        let mut tx = self.pool.begin().await?;

        let current: Option<AttemptWindow> = sqlx::query_as::<_, LoginAttemptEntity>(
            r#"
            SELECT identifier, attempt_count, window_start
            FROM login_attempts
            WHERE identifier = $1
            FOR UPDATE
            "#,
        )
        .bind(identifier)
        .fetch_optional(&mut *tx)
        .await?
        .map(Into::into);

        let (decision, next) = evaluate(current.as_ref(), Utc::now());

        if current.as_ref() != Some(&next) {
            sqlx::query(
                r#"
                INSERT INTO login_attempts (identifier, attempt_count, window_start)
                VALUES ($1, $2, $3)
                ON CONFLICT (identifier) DO UPDATE SET
                    attempt_count = EXCLUDED.attempt_count,
                    window_start = EXCLUDED.window_start
                "#,
            )
            .bind(identifier)
            .bind(next.count)
            .bind(next.window_start)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(decision)
    }
}

#[async_trait]
impl AttemptLimiter for PgAttemptLimiter {
    async fn check(&self, identifier: &str) -> Result<AttemptDecision, ReportError> {
        self.record_attempt(identifier)
            .await
            .map_err(ReportError::data_source)
    }

    async fn remaining_lockout(&self, identifier: &str) -> Result<i64, ReportError> {
        let window = self
            .find(identifier)
            .await
            .map_err(ReportError::data_source)?;
        Ok(window
            .map(|w| w.remaining_lockout_minutes(Utc::now()))
            .unwrap_or(0))
    }

    async fn purge_expired(&self) -> Result<u64, ReportError> {
        let removed = self
            .delete_expired()
            .await
            .map_err(ReportError::data_source)?;
        tracing::debug!(removed, "Purged expired login attempt windows");
        Ok(removed)
    }
}
