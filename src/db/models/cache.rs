use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Cached extraction result, keyed by image fingerprint. Last write for a
/// fingerprint wins; entries derive deterministically from the same image.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheRow {
    pub fingerprint: String,
    /// Model that produced the cached trades
    pub model_id: String,
    /// Prompt version tag, for forward-compatible invalidation
    pub prompt_version: String,
    /// OCR quality score at capture time. Stored for observability; the
    /// bypass rule does not re-validate it.
    pub ocr_quality: Option<f32>,
    /// Normalized trade array as JSON
    pub trades: serde_json::Value,
    pub tier: String,
    pub expires_at: DateTime<Utc>,
}
