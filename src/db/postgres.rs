//! Postgres-backed [`ExtractionStore`], composed from the per-table
//! repositories in [`crate::db::handlers`].

use crate::db::errors::Result;
use crate::db::handlers::{Budgets, CostLog, ExtractionCache, RateEvents};
use crate::db::models::{BudgetRow, CacheRow, CostLogCreate, CostLogRow};
use crate::db::store::ExtractionStore;
use crate::types::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, run migrations, and return a ready store.
    pub async fn connect(url: &str, max_connections: Option<u32>) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.unwrap_or(10))
            .connect(url)
            .await?;
        crate::migrator().run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ExtractionStore for PgStore {
    async fn get_budget(&self, user_id: UserId, month_start: NaiveDate) -> Result<Option<BudgetRow>> {
        Budgets::new(&self.pool).get(user_id, month_start).await
    }

    async fn add_spend(
        &self,
        user_id: UserId,
        month_start: NaiveDate,
        amount_cents: i64,
        default_budget_cents: i64,
    ) -> Result<()> {
        Budgets::new(&self.pool)
            .add_spend(user_id, month_start, amount_cents, default_budget_cents)
            .await
    }

    async fn record_rate_event(&self, user_id: UserId, endpoint: &str, at: DateTime<Utc>) -> Result<()> {
        RateEvents::new(&self.pool).record(user_id, endpoint, at).await
    }

    async fn count_rate_events(&self, user_id: UserId, endpoint: &str, since: DateTime<Utc>) -> Result<u64> {
        RateEvents::new(&self.pool).count_since(user_id, endpoint, since).await
    }

    async fn get_cache_entry(&self, fingerprint: &str) -> Result<Option<CacheRow>> {
        ExtractionCache::new(&self.pool).get(fingerprint).await
    }

    async fn put_cache_entry(&self, row: &CacheRow) -> Result<()> {
        ExtractionCache::new(&self.pool).upsert(row).await
    }

    async fn append_cost_log(&self, entry: &CostLogCreate) -> Result<i64> {
        CostLog::new(&self.pool).append(entry).await
    }

    async fn list_cost_log(&self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CostLogRow>> {
        CostLog::new(&self.pool).list_for_user(user_id, skip, limit).await
    }
}
