//! Fingerprint-keyed result cache.
//!
//! Storage keeps rows past their expiry; this layer decides whether a row may
//! be served. A row is served only when it has not expired AND the current
//! trade-count estimate does not exceed the cached trade count (estimates of
//! 0 or 1 always accept, since a single-trade estimate carries no evidence the
//! cached result missed anything).

use crate::config::CacheConfig;
use crate::db::models::CacheRow;
use crate::db::store::ExtractionStore;
use crate::errors::Result;
use crate::extraction::trade::ExtractedTrade;
use crate::types::Tier;
use chrono::Utc;
use std::sync::Arc;

pub struct ResultCache {
    store: Arc<dyn ExtractionStore>,
    config: CacheConfig,
}

/// A cache row that passed the expiry and bypass checks.
#[derive(Debug)]
pub struct CacheHit {
    pub trades: Vec<ExtractedTrade>,
    pub model_id: String,
    pub cached_tier: Tier,
}

impl ResultCache {
    pub fn new(store: Arc<dyn ExtractionStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Look up a fingerprint, applying expiry and the estimate bypass rule.
    pub async fn lookup(&self, fingerprint: &str, estimate: u32) -> Result<Option<CacheHit>> {
        let Some(row) = self.store.get_cache_entry(fingerprint).await? else {
            return Ok(None);
        };

        if row.expires_at <= Utc::now() {
            tracing::debug!(fingerprint, "Cache entry expired");
            return Ok(None);
        }

        let trades: Vec<ExtractedTrade> = match serde_json::from_value(row.trades.clone()) {
            Ok(trades) => trades,
            Err(e) => {
                // A row written by an older shape of the crate; treat as miss.
                tracing::warn!(fingerprint, error = %e, "Cache entry did not deserialize, ignoring");
                return Ok(None);
            }
        };

        let cached_count = trades.len() as u32;
        if estimate > 1 && estimate > cached_count {
            tracing::debug!(
                fingerprint,
                estimate,
                cached_count,
                "Bypassing cache: estimate exceeds cached trade count"
            );
            return Ok(None);
        }

        let cached_tier = row.tier.parse().unwrap_or(Tier::Lite);
        Ok(Some(CacheHit {
            trades,
            model_id: row.model_id,
            cached_tier,
        }))
    }

    /// Store a fresh extraction result under its fingerprint.
    pub async fn store(
        &self,
        fingerprint: &str,
        trades: &[ExtractedTrade],
        model_id: &str,
        prompt_version: &str,
        tier: Tier,
        ocr_quality: Option<f32>,
    ) -> Result<()> {
        let row = CacheRow {
            fingerprint: fingerprint.to_string(),
            model_id: model_id.to_string(),
            prompt_version: prompt_version.to_string(),
            ocr_quality,
            trades: serde_json::to_value(trades).map_err(anyhow::Error::from)?,
            tier: tier.as_str().to_string(),
            expires_at: Utc::now() + self.config.ttl,
        };
        self.store.put_cache_entry(&row).await?;
        Ok(())
    }
}
