use crate::db::errors::Result;
use crate::db::models::BudgetRow;
use crate::types::UserId;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct Budgets<'p> {
    pool: &'p PgPool,
}

impl<'p> Budgets<'p> {
    pub fn new(pool: &'p PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: UserId, month_start: NaiveDate) -> Result<Option<BudgetRow>> {
        let row = sqlx::query_as::<_, BudgetRow>(
            r#"
            SELECT user_id, month_start, spend_cents, budget_cents
            FROM ai_budgets
            WHERE user_id = $1 AND month_start = $2
            "#,
        )
        .bind(user_id)
        .bind(month_start)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Atomic add on the month's spend counter. The increment happens inside
    /// the UPDATE so concurrent requests never lose each other's additions.
    pub async fn add_spend(
        &self,
        user_id: UserId,
        month_start: NaiveDate,
        amount_cents: i64,
        default_budget_cents: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ai_budgets (user_id, month_start, spend_cents, budget_cents)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, month_start)
            DO UPDATE SET spend_cents = ai_budgets.spend_cents + EXCLUDED.spend_cents
            "#,
        )
        .bind(user_id)
        .bind(month_start)
        .bind(amount_cents)
        .bind(default_budget_cents)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
