//! In-memory [`ExtractionStore`] used by tests and URL-less development runs.
//!
//! Semantics mirror the Postgres store: spend increments are atomic (one lock
//! per mutation), rate events are append-only and counted by timestamp, cache
//! writes are last-write-wins.

use crate::db::errors::Result;
use crate::db::models::{BudgetRow, CacheRow, CostLogCreate, CostLogRow};
use crate::db::store::ExtractionStore;
use crate::types::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    budgets: HashMap<(UserId, NaiveDate), BudgetRow>,
    rate_events: Vec<(UserId, String, DateTime<Utc>)>,
    cache: HashMap<String, CacheRow>,
    cost_log: Vec<CostLogRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a budget row directly, for tests.
    pub fn set_budget(&self, row: BudgetRow) {
        let mut inner = self.inner.lock();
        inner.budgets.insert((row.user_id, row.month_start), row);
    }

    /// Number of cost log rows recorded so far, for tests.
    pub fn cost_log_len(&self) -> usize {
        self.inner.lock().cost_log.len()
    }
}

#[async_trait::async_trait]
impl ExtractionStore for MemoryStore {
    async fn get_budget(&self, user_id: UserId, month_start: NaiveDate) -> Result<Option<BudgetRow>> {
        Ok(self.inner.lock().budgets.get(&(user_id, month_start)).cloned())
    }

    async fn add_spend(
        &self,
        user_id: UserId,
        month_start: NaiveDate,
        amount_cents: i64,
        default_budget_cents: i64,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let row = inner.budgets.entry((user_id, month_start)).or_insert(BudgetRow {
            user_id,
            month_start,
            spend_cents: 0,
            budget_cents: default_budget_cents,
        });
        row.spend_cents += amount_cents;
        Ok(())
    }

    async fn record_rate_event(&self, user_id: UserId, endpoint: &str, at: DateTime<Utc>) -> Result<()> {
        self.inner.lock().rate_events.push((user_id, endpoint.to_string(), at));
        Ok(())
    }

    async fn count_rate_events(&self, user_id: UserId, endpoint: &str, since: DateTime<Utc>) -> Result<u64> {
        let inner = self.inner.lock();
        let count = inner
            .rate_events
            .iter()
            .filter(|(user, ep, at)| *user == user_id && ep == endpoint && *at >= since)
            .count();
        Ok(count as u64)
    }

    async fn get_cache_entry(&self, fingerprint: &str) -> Result<Option<CacheRow>> {
        Ok(self.inner.lock().cache.get(fingerprint).cloned())
    }

    async fn put_cache_entry(&self, row: &CacheRow) -> Result<()> {
        self.inner.lock().cache.insert(row.fingerprint.clone(), row.clone());
        Ok(())
    }

    async fn append_cost_log(&self, entry: &CostLogCreate) -> Result<i64> {
        let mut inner = self.inner.lock();
        let id = inner.cost_log.len() as i64 + 1;
        inner.cost_log.push(CostLogRow {
            id,
            user_id: entry.user_id,
            endpoint: entry.endpoint.clone(),
            tier: entry.tier.clone(),
            model_id: entry.model_id.clone(),
            tokens_in: entry.tokens_in,
            tokens_out: entry.tokens_out,
            cost_cents: entry.cost_cents,
            latency_ms: entry.latency_ms,
            cache_hit: entry.cache_hit,
            ocr_quality: entry.ocr_quality,
            estimated_trades: entry.estimated_trades,
            error: entry.error.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_cost_log(&self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CostLogRow>> {
        let inner = self.inner.lock();
        let rows = inner
            .cost_log
            .iter()
            .rev()
            .filter(|row| row.user_id == user_id)
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn month() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    #[tokio::test]
    async fn test_add_spend_creates_then_accumulates() {
        let store = MemoryStore::new();
        let user = UserId::new_v4();

        store.add_spend(user, month(), 3, 500).await.unwrap();
        store.add_spend(user, month(), 4, 500).await.unwrap();

        let row = store.get_budget(user, month()).await.unwrap().unwrap();
        assert_eq!(row.spend_cents, 7);
        assert_eq!(row.budget_cents, 500);
    }

    #[tokio::test]
    async fn test_rate_events_count_by_window() {
        let store = MemoryStore::new();
        let user = UserId::new_v4();
        let now = Utc::now();

        for minutes_ago in [70, 30, 10, 0] {
            store
                .record_rate_event(user, "extract_trades", now - Duration::minutes(minutes_ago))
                .await
                .unwrap();
        }

        let hour = store
            .count_rate_events(user, "extract_trades", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(hour, 3);

        // events for other endpoints or users are not counted
        let other = store
            .count_rate_events(UserId::new_v4(), "extract_trades", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(other, 0);
    }

    #[tokio::test]
    async fn test_cache_last_write_wins() {
        let store = MemoryStore::new();
        let mut row = CacheRow {
            fingerprint: "abc".to_string(),
            model_id: "gpt-5-nano".to_string(),
            prompt_version: "v3".to_string(),
            ocr_quality: Some(0.9),
            trades: serde_json::json!([]),
            tier: "lite".to_string(),
            expires_at: Utc::now(),
        };
        store.put_cache_entry(&row).await.unwrap();
        row.model_id = "gpt-5".to_string();
        store.put_cache_entry(&row).await.unwrap();

        let fetched = store.get_cache_entry("abc").await.unwrap().unwrap();
        assert_eq!(fetched.model_id, "gpt-5");
    }

    #[tokio::test]
    async fn test_cost_log_newest_first_with_pagination() {
        let store = MemoryStore::new();
        let user = UserId::new_v4();
        for tier in ["lite", "deep", "cached"] {
            store
                .append_cost_log(&CostLogCreate {
                    user_id: user,
                    endpoint: "extract_trades".to_string(),
                    tier: tier.to_string(),
                    model_id: "m".to_string(),
                    tokens_in: 0,
                    tokens_out: 0,
                    cost_cents: 0,
                    latency_ms: 1,
                    cache_hit: false,
                    ocr_quality: None,
                    estimated_trades: 1,
                    error: None,
                })
                .await
                .unwrap();
        }

        let rows = store.list_cost_log(user, 0, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tier, "cached");
        assert_eq!(rows[1].tier, "deep");

        let rest = store.list_cost_log(user, 2, 10).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].tier, "lite");
    }
}
