//! Monthly budget accounting and the per-call cost log.
//!
//! Spend is bucketed by UTC calendar month. The budget check is a hard gate
//! and propagates storage errors; cost logging after a served result never
//! fails the request, it logs and moves on.

use crate::config::BudgetConfig;
use crate::db::models::CostLogCreate;
use crate::db::store::ExtractionStore;
use crate::errors::Result;
use crate::types::{BudgetBand, UserId, abbrev_uuid};
use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;

/// A user's budget position for the current month.
#[derive(Debug, Clone, Copy)]
pub struct BudgetStatus {
    pub spend_cents: i64,
    pub budget_cents: i64,
    pub percent_used: f64,
    pub band: BudgetBand,
}

pub struct CostLedger {
    store: Arc<dyn ExtractionStore>,
    config: BudgetConfig,
}

/// First day of the UTC month containing `today`.
pub fn month_start(today: NaiveDate) -> NaiveDate {
    // with_day(1) cannot fail for day 1
    today.with_day(1).unwrap_or(today)
}

impl CostLedger {
    pub fn new(store: Arc<dyn ExtractionStore>, config: BudgetConfig) -> Self {
        Self { store, config }
    }

    /// Compute the user's budget band for the current month. A user with no
    /// budget row is on the default budget with zero spend.
    pub async fn check_budget(&self, user_id: UserId) -> Result<BudgetStatus> {
        let month = month_start(Utc::now().date_naive());
        let row = self.store.get_budget(user_id, month).await?;

        let (spend_cents, budget_cents) = match row {
            Some(row) => (row.spend_cents, row.budget_cents),
            None => (0, self.config.default_monthly_cents),
        };

        let percent_used = if budget_cents > 0 {
            spend_cents as f64 * 100.0 / budget_cents as f64
        } else {
            // A zero or negative budget means the user is cut off.
            100.0
        };

        let band = if percent_used >= self.config.block_percent {
            BudgetBand::Blocked
        } else if percent_used >= self.config.force_lite_percent {
            BudgetBand::ForceLite
        } else {
            BudgetBand::Normal
        };

        Ok(BudgetStatus {
            spend_cents,
            budget_cents,
            percent_used,
            band,
        })
    }

    /// Append a cost log row and, for paid calls, add the spend to the month's
    /// budget. Called after the response outcome is already decided, so
    /// failures are logged rather than surfaced.
    pub async fn log_cost(&self, user_id: UserId, entry: &CostLogCreate) {
        if let Err(e) = self.store.append_cost_log(entry).await {
            tracing::warn!(
                user_id = %abbrev_uuid(&user_id),
                error = %e,
                "Failed to append cost log entry"
            );
        }

        if entry.cost_cents > 0 {
            let month = month_start(Utc::now().date_naive());
            if let Err(e) = self
                .store
                .add_spend(user_id, month, entry.cost_cents, self.config.default_monthly_cents)
                .await
            {
                tracing::warn!(
                    user_id = %abbrev_uuid(&user_id),
                    cost_cents = entry.cost_cents,
                    error = %e,
                    "Failed to record spend against monthly budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::models::BudgetRow;
    use crate::types::Tier;
    use uuid::Uuid;

    fn seed(store: &MemoryStore, user_id: UserId, month: NaiveDate, spend: i64, budget: i64) {
        store.set_budget(BudgetRow {
            user_id,
            month_start: month,
            spend_cents: spend,
            budget_cents: budget,
        });
    }

    fn ledger() -> (CostLedger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = CostLedger::new(store.clone(), BudgetConfig::default());
        (ledger, store)
    }

    fn paid_entry(user_id: UserId, cost_cents: i64) -> CostLogCreate {
        CostLogCreate {
            user_id,
            endpoint: "extract_trades".to_string(),
            tier: Tier::Lite.as_str().to_string(),
            model_id: "gpt-5-nano".to_string(),
            tokens_in: 1200,
            tokens_out: 350,
            cost_cents,
            latency_ms: 900,
            cache_hit: false,
            ocr_quality: Some(0.9),
            estimated_trades: 2,
            error: None,
        }
    }

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user_gets_default_budget() {
        let (ledger, _) = ledger();
        let status = ledger.check_budget(Uuid::new_v4()).await.unwrap();
        assert_eq!(status.spend_cents, 0);
        assert_eq!(status.budget_cents, 500);
        assert_eq!(status.band, BudgetBand::Normal);
    }

    #[tokio::test]
    async fn test_band_thresholds_in_order() {
        let (ledger, store) = ledger();
        let user = Uuid::new_v4();
        let month = month_start(Utc::now().date_naive());

        seed(&store, user, month, 399, 500);
        assert_eq!(ledger.check_budget(user).await.unwrap().band, BudgetBand::Normal);

        // 400/500 = exactly 80%
        seed(&store, user, month, 400, 500);
        assert_eq!(ledger.check_budget(user).await.unwrap().band, BudgetBand::ForceLite);

        seed(&store, user, month, 500, 500);
        assert_eq!(ledger.check_budget(user).await.unwrap().band, BudgetBand::Blocked);

        // blocked wins over force-lite above 100%
        seed(&store, user, month, 900, 500);
        assert_eq!(ledger.check_budget(user).await.unwrap().band, BudgetBand::Blocked);
    }

    #[tokio::test]
    async fn test_log_cost_adds_spend_for_paid_calls() {
        let (ledger, store) = ledger();
        let user = Uuid::new_v4();

        ledger.log_cost(user, &paid_entry(user, 3)).await;
        let status = ledger.check_budget(user).await.unwrap();
        assert_eq!(status.spend_cents, 3);
        assert_eq!(store.cost_log_len(), 1);
    }

    #[tokio::test]
    async fn test_free_calls_log_but_do_not_spend() {
        let (ledger, store) = ledger();
        let user = Uuid::new_v4();

        ledger.log_cost(user, &paid_entry(user, 0)).await;
        let status = ledger.check_budget(user).await.unwrap();
        assert_eq!(status.spend_cents, 0);
        assert_eq!(store.cost_log_len(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_blocks() {
        let (ledger, store) = ledger();
        let user = Uuid::new_v4();
        let month = month_start(Utc::now().date_naive());
        seed(&store, user, month, 0, 0);
        assert_eq!(ledger.check_budget(user).await.unwrap().band, BudgetBand::Blocked);
    }
}
