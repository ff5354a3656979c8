use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Append-only record of one inference attempt (or cache hit). Write-once;
/// never updated or deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLogCreate {
    pub user_id: UserId,
    pub endpoint: String,
    /// `lite`, `deep` or `cached`
    pub tier: String,
    pub model_id: String,
    pub tokens_in: i64,
    pub tokens_out: i64,
    pub cost_cents: i64,
    pub latency_ms: i64,
    // Diagnostics
    pub cache_hit: bool,
    pub ocr_quality: Option<f32>,
    pub estimated_trades: i32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CostLogRow {
    pub id: i64,
    pub user_id: UserId,
    pub endpoint: String,
    pub tier: String,
    pub model_id: String,
    pub tokens_in: i64,
    pub tokens_out: i64,
    pub cost_cents: i64,
    pub latency_ms: i64,
    pub cache_hit: bool,
    pub ocr_quality: Option<f32>,
    pub estimated_trades: i32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
