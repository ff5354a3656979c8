use crate::types::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per (user, calendar month). Created lazily on the first paid
/// increment; absence means the user is on the default free budget.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BudgetRow {
    pub user_id: UserId,
    /// First day of the month this row covers (UTC)
    pub month_start: NaiveDate,
    pub spend_cents: i64,
    pub budget_cents: i64,
}
