use crate::db::errors::Result;
use crate::db::models::{CostLogCreate, CostLogRow};
use crate::types::UserId;
use sqlx::PgPool;

pub struct CostLog<'p> {
    pool: &'p PgPool,
}

impl<'p> CostLog<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &CostLogCreate) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cost_log (
                user_id, endpoint, tier, model_id,
                tokens_in, tokens_out, cost_cents, latency_ms,
                cache_hit, ocr_quality, estimated_trades, error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.endpoint)
        .bind(&entry.tier)
        .bind(&entry.model_id)
        .bind(entry.tokens_in)
        .bind(entry.tokens_out)
        .bind(entry.cost_cents)
        .bind(entry.latency_ms)
        .bind(entry.cache_hit)
        .bind(entry.ocr_quality)
        .bind(entry.estimated_trades)
        .bind(&entry.error)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    pub async fn list_for_user(&self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CostLogRow>> {
        let rows = sqlx::query_as::<_, CostLogRow>(
            r#"
            SELECT id, user_id, endpoint, tier, model_id,
                   tokens_in, tokens_out, cost_cents, latency_ms,
                   cache_hit, ocr_quality, estimated_trades, error, created_at
            FROM cost_log
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
