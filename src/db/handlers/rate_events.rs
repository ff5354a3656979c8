use crate::db::errors::Result;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Append-only log of extraction calls, counted over sliding windows. No
/// teardown: rows age out of every window naturally as time passes.
pub struct RateEvents<'p> {
    pool: &'p PgPool,
}

impl<'p> RateEvents<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, user_id: UserId, endpoint: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rate_events (user_id, endpoint, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(endpoint)
        .bind(at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn count_since(&self, user_id: UserId, endpoint: &str, since: DateTime<Utc>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM rate_events
            WHERE user_id = $1 AND endpoint = $2 AND created_at >= $3
            "#,
        )
        .bind(user_id)
        .bind(endpoint)
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}
