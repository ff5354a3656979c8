//! The storage seam the extraction pipeline talks to.
//!
//! The pipeline never issues SQL itself; it depends on this trait so the same
//! router code runs against Postgres in production and the in-memory store in
//! tests and development.

use crate::db::errors::Result;
use crate::db::models::{BudgetRow, CacheRow, CostLogCreate, CostLogRow};
use crate::types::UserId;
use chrono::{DateTime, NaiveDate, Utc};

/// Key-value + counter storage used by the budget gate, rate limiter, result
/// cache and cost log.
#[async_trait::async_trait]
pub trait ExtractionStore: Send + Sync {
    /// Fetch the budget row for (user, month), if one exists.
    async fn get_budget(&self, user_id: UserId, month_start: NaiveDate) -> Result<Option<BudgetRow>>;

    /// Atomically add `amount_cents` to the month's spend, creating the row
    /// with `default_budget_cents` if absent. Must be a storage-level atomic
    /// add, not read-modify-write.
    async fn add_spend(
        &self,
        user_id: UserId,
        month_start: NaiveDate,
        amount_cents: i64,
        default_budget_cents: i64,
    ) -> Result<()>;

    /// Append one rate event for (user, endpoint).
    async fn record_rate_event(&self, user_id: UserId, endpoint: &str, at: DateTime<Utc>) -> Result<()>;

    /// Count rate events for (user, endpoint) with timestamp >= `since`.
    async fn count_rate_events(&self, user_id: UserId, endpoint: &str, since: DateTime<Utc>) -> Result<u64>;

    /// Fetch the cache row for a fingerprint, expired or not. Expiry and the
    /// bypass invariant are applied by the caller.
    async fn get_cache_entry(&self, fingerprint: &str) -> Result<Option<CacheRow>>;

    /// Upsert the cache row for its fingerprint; last write wins.
    async fn put_cache_entry(&self, row: &CacheRow) -> Result<()>;

    /// Append one cost log row, returning its id.
    async fn append_cost_log(&self, entry: &CostLogCreate) -> Result<i64>;

    /// Recent cost log rows for a user, newest first.
    async fn list_cost_log(&self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CostLogRow>>;
}
