//! Response models for the usage endpoints.

use crate::db::models::CostLogRow;
use crate::types::{BudgetBand, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The caller's budget position for the current UTC month.
#[derive(Debug, Serialize, ToSchema)]
pub struct BudgetResponse {
    pub spend_cents: i64,
    pub budget_cents: i64,
    pub percent_used: f64,
    pub band: BudgetBand,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of entries to skip (for pagination)
    pub skip: Option<i64>,
    /// Maximum number of entries to return (default 50, max 500)
    pub limit: Option<i64>,
}

/// One cost log entry, newest first in listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct CostLogEntryResponse {
    pub id: i64,
    pub endpoint: String,
    pub tier: Option<Tier>,
    pub model_id: String,
    pub tokens_in: i64,
    pub tokens_out: i64,
    pub cost_cents: i64,
    pub latency_ms: i64,
    pub cache_hit: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CostLogRow> for CostLogEntryResponse {
    fn from(row: CostLogRow) -> Self {
        Self {
            id: row.id,
            endpoint: row.endpoint,
            tier: row.tier.parse().ok(),
            model_id: row.model_id,
            tokens_in: row.tokens_in,
            tokens_out: row.tokens_out,
            cost_cents: row.cost_cents,
            latency_ms: row.latency_ms,
            cache_hit: row.cache_hit,
            error: row.error,
            created_at: row.created_at,
        }
    }
}
