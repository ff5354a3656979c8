use crate::db::errors::Result;
use crate::db::models::CacheRow;
use sqlx::PgPool;

pub struct ExtractionCache<'p> {
    pool: &'p PgPool,
}

impl<'p> ExtractionCache<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, fingerprint: &str) -> Result<Option<CacheRow>> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT fingerprint, model_id, prompt_version, ocr_quality, trades, tier, expires_at
            FROM extraction_cache
            WHERE fingerprint = $1
            "#,
        )
        .bind(fingerprint)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Upsert: the latest extraction for a fingerprint replaces any prior one.
    pub async fn upsert(&self, row: &CacheRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO extraction_cache (fingerprint, model_id, prompt_version, ocr_quality, trades, tier, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (fingerprint)
            DO UPDATE SET
                model_id = EXCLUDED.model_id,
                prompt_version = EXCLUDED.prompt_version,
                ocr_quality = EXCLUDED.ocr_quality,
                trades = EXCLUDED.trades,
                tier = EXCLUDED.tier,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&row.fingerprint)
        .bind(&row.model_id)
        .bind(&row.prompt_version)
        .bind(row.ocr_quality)
        .bind(&row.trades)
        .bind(&row.tier)
        .bind(row.expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
