//! The extraction state machine.
//!
//! Sequences the entry gates (rate limit, budget, cache), selects the
//! inference tier, runs at most two inference calls, and applies the side
//! effects (cache write, cost log) in a fixed order. The lite attempt is
//! reduced to a tagged outcome so the single-escalation rule is dispatched on
//! a tag rather than buried in nested conditionals.

use crate::config::{Config, EXTRACTION_ENDPOINT, ExtractionConfig, InferenceConfig};
use crate::db::models::CostLogCreate;
use crate::db::store::ExtractionStore;
use crate::errors::{Error, Result};
use crate::extraction::cache::ResultCache;
use crate::extraction::client::{ChatRequest, InferenceClient, InferenceError};
use crate::extraction::estimator::TradeCountEstimator;
use crate::extraction::ledger::CostLedger;
use crate::extraction::normalize::normalize_trades;
use crate::extraction::prompt;
use crate::extraction::rate_limit::RateLimiter;
use crate::extraction::repair::extract_json;
use crate::extraction::trade::ExtractedTrade;
use crate::types::{BudgetBand, Fingerprint, Tier, UserId, abbrev_uuid};
use std::sync::Arc;
use std::time::Instant;

/// One extraction request, already authenticated and fingerprinted.
#[derive(Debug, Clone)]
pub struct ExtractionInput {
    pub fingerprint: Fingerprint,
    /// Raw image, required for the deep tier. May be absent when the caller
    /// supplies a precomputed fingerprint only.
    pub image_base64: Option<String>,
    pub ocr_text: Option<String>,
    pub ocr_confidence: Option<f32>,
    /// Explicit user-initiated retry; routes straight to the deep tier.
    pub force_deep: bool,
}

/// Terminal successful result of one extraction request.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub trades: Vec<ExtractedTrade>,
    pub tier: Tier,
    pub cached: bool,
    pub model_id: String,
    pub estimated_trades: u32,
}

/// How a single inference call resolved, before escalation dispatch.
enum CallResult {
    /// Structurally valid and normalized.
    Parsed(Vec<ExtractedTrade>),
    /// All four repair strategies failed. Recoverable only from the lite tier.
    ParseFailure,
    /// Upstream or normalization failure that must not trigger escalation.
    Fatal(Error),
}

pub struct ExtractionRouter {
    rate_limiter: RateLimiter,
    ledger: Arc<CostLedger>,
    cache: ResultCache,
    estimator: TradeCountEstimator,
    client: Arc<dyn InferenceClient>,
    extraction: ExtractionConfig,
    inference: InferenceConfig,
}

impl ExtractionRouter {
    pub fn new(
        store: Arc<dyn ExtractionStore>,
        client: Arc<dyn InferenceClient>,
        ledger: Arc<CostLedger>,
        config: &Config,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(store.clone(), config.rate_limit.clone()),
            ledger,
            cache: ResultCache::new(store, config.cache.clone()),
            estimator: TradeCountEstimator::new(config.estimator.max_trades),
            client,
            extraction: config.extraction.clone(),
            inference: config.inference.clone(),
        }
    }

    /// Run one extraction request end to end.
    pub async fn extract(&self, user_id: UserId, input: ExtractionInput) -> Result<ExtractionOutcome> {
        // Entry gates, cheapest first. Rejections here incur no cost and
        // write no log rows.
        self.rate_limiter.check_and_record(user_id).await?;

        let status = self.ledger.check_budget(user_id).await?;
        if status.band == BudgetBand::Blocked {
            tracing::info!(
                user_id = %abbrev_uuid(&user_id),
                spend_cents = status.spend_cents,
                budget_cents = status.budget_cents,
                "Extraction rejected: monthly AI budget exhausted"
            );
            return Err(Error::BudgetBlocked {
                message: format!(
                    "Monthly AI budget exhausted ({} of {} cents used)",
                    status.spend_cents, status.budget_cents
                ),
            });
        }

        // One estimate drives token sizing and cache bypass; never recomputed.
        let estimate = self.estimator.estimate(input.ocr_text.as_deref());

        if let Some(hit) = self.cache.lookup(&input.fingerprint, estimate).await? {
            tracing::debug!(
                user_id = %abbrev_uuid(&user_id),
                fingerprint = %input.fingerprint,
                trades = hit.trades.len(),
                "Serving extraction from cache"
            );
            let entry = self.log_entry(
                user_id,
                Tier::Cached,
                &hit.model_id,
                0,
                0,
                0,
                0,
                true,
                &input,
                estimate,
                None,
            );
            self.ledger.log_cost(user_id, &entry).await;
            return Ok(ExtractionOutcome {
                trades: hit.trades,
                tier: Tier::Cached,
                cached: true,
                model_id: hit.model_id,
                estimated_trades: estimate,
            });
        }

        let has_ocr_text = input
            .ocr_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());

        // Tier selection. The force-lite band overrides everything including
        // an explicit deep retry; without OCR text there is nothing the lite
        // tier can work from, so the request is refused as a budget condition.
        let force_lite = status.band == BudgetBand::ForceLite;
        let tier = if force_lite {
            if !has_ocr_text {
                return Err(Error::BudgetBlocked {
                    message: "Monthly AI budget nearly exhausted; only text-based extraction \
                              is available and this image has no readable text"
                        .to_string(),
                });
            }
            Tier::Lite
        } else if input.force_deep {
            Tier::Deep
        } else if has_ocr_text
            && input.ocr_confidence.unwrap_or(0.0) >= self.extraction.min_ocr_confidence
        {
            Tier::Lite
        } else {
            Tier::Deep
        };

        // Cost log rows are buffered so the cache write always lands before
        // any of them, per the side effect ordering contract.
        let mut log_entries: Vec<CostLogCreate> = Vec::with_capacity(2);

        let result = match tier {
            Tier::Lite => {
                let (outcome, entry) = self.run_call(user_id, Tier::Lite, &input, estimate).await;
                log_entries.push(entry);
                match outcome {
                    CallResult::Parsed(trades)
                        if (trades.len() as u32) >= estimate || estimate <= 1 =>
                    {
                        Ok((trades, Tier::Lite))
                    }
                    CallResult::Parsed(trades) if force_lite => {
                        // No escalation budget left; best-effort partial result.
                        tracing::info!(
                            user_id = %abbrev_uuid(&user_id),
                            got = trades.len(),
                            estimate,
                            "Incomplete lite extraction returned as-is under force-lite budget"
                        );
                        Ok((trades, Tier::Lite))
                    }
                    CallResult::ParseFailure if force_lite => Err(Error::UnparseableOutput),
                    CallResult::Parsed(trades) => {
                        tracing::info!(
                            user_id = %abbrev_uuid(&user_id),
                            got = trades.len(),
                            estimate,
                            "Lite extraction incomplete, escalating to deep tier"
                        );
                        let (outcome, entry) =
                            self.run_call(user_id, Tier::Deep, &input, estimate).await;
                        log_entries.push(entry);
                        match outcome {
                            // A second incomplete result is terminal.
                            CallResult::Parsed(trades) => Ok((trades, Tier::Deep)),
                            CallResult::ParseFailure => Err(Error::UnparseableOutput),
                            CallResult::Fatal(e) => Err(e),
                        }
                    }
                    CallResult::ParseFailure => {
                        tracing::info!(
                            user_id = %abbrev_uuid(&user_id),
                            "Lite output unparseable, escalating to deep tier"
                        );
                        let (outcome, entry) =
                            self.run_call(user_id, Tier::Deep, &input, estimate).await;
                        log_entries.push(entry);
                        match outcome {
                            CallResult::Parsed(trades) => Ok((trades, Tier::Deep)),
                            CallResult::ParseFailure => Err(Error::UnparseableOutput),
                            CallResult::Fatal(e) => Err(e),
                        }
                    }
                    CallResult::Fatal(e) => Err(e),
                }
            }
            Tier::Deep => {
                let (outcome, entry) = self.run_call(user_id, Tier::Deep, &input, estimate).await;
                log_entries.push(entry);
                match outcome {
                    CallResult::Parsed(trades) => Ok((trades, Tier::Deep)),
                    CallResult::ParseFailure => Err(Error::UnparseableOutput),
                    CallResult::Fatal(e) => Err(e),
                }
            }
            Tier::Cached => unreachable!("cached tier is never selected for inference"),
        };

        match result {
            Ok((trades, used_tier)) => {
                let model_id = self.model_for(used_tier).to_string();
                // Cache write first, then the buffered log rows. Neither may
                // fail the already-computed response.
                if let Err(e) = self
                    .cache
                    .store(
                        &input.fingerprint,
                        &trades,
                        &model_id,
                        &self.inference.prompt_version,
                        used_tier,
                        input.ocr_confidence,
                    )
                    .await
                {
                    tracing::warn!(
                        fingerprint = %input.fingerprint,
                        error = %e,
                        "Failed to write extraction cache entry"
                    );
                }
                for entry in &log_entries {
                    self.ledger.log_cost(user_id, entry).await;
                }
                Ok(ExtractionOutcome {
                    trades,
                    tier: used_tier,
                    cached: false,
                    model_id,
                    estimated_trades: estimate,
                })
            }
            Err(e) => {
                for entry in &log_entries {
                    self.ledger.log_cost(user_id, entry).await;
                }
                Err(e)
            }
        }
    }

    /// Issue one inference call on `tier`, parse and normalize the output,
    /// and produce the matching cost log row.
    async fn run_call(
        &self,
        user_id: UserId,
        tier: Tier,
        input: &ExtractionInput,
        estimate: u32,
    ) -> (CallResult, CostLogCreate) {
        let model_id = self.model_for(tier).to_string();

        let messages = match tier {
            Tier::Lite => prompt::lite_messages(input.ocr_text.as_deref().unwrap_or_default()),
            Tier::Deep => {
                let Some(image) = input.image_base64.as_deref() else {
                    let entry = self.log_entry(
                        user_id,
                        tier,
                        &model_id,
                        0,
                        0,
                        0,
                        0,
                        false,
                        input,
                        estimate,
                        Some("image required for deep extraction".to_string()),
                    );
                    return (
                        CallResult::Fatal(Error::BadRequest {
                            message: "This image needs the vision model, but only a fingerprint \
                                      was supplied. Resubmit with the image data."
                                .to_string(),
                        }),
                        entry,
                    );
                };
                prompt::deep_messages(image, input.ocr_text.as_deref())
            }
            Tier::Cached => unreachable!("cached tier is never called"),
        };

        let sizing = match tier {
            Tier::Lite => self.inference.lite_tokens,
            _ => self.inference.deep_tokens,
        };
        let request = ChatRequest {
            model: model_id.clone(),
            messages,
            max_tokens: sizing.max_tokens(estimate),
            stop: Some(vec![self.inference.stop.clone()]),
            temperature: 0.0,
        };

        let started = Instant::now();
        let completion = self.client.complete(request).await;
        let latency_ms = started.elapsed().as_millis() as i64;

        match completion {
            Ok(completion) => {
                let pricing = match tier {
                    Tier::Lite => self.inference.lite_pricing,
                    _ => self.inference.deep_pricing,
                };
                let cost_cents =
                    pricing.cost_cents(completion.tokens_in as i64, completion.tokens_out as i64);

                let (result, error_note) = match extract_json(&completion.content) {
                    Ok(value) => match normalize_trades(&value, self.extraction.max_trades_per_image)
                    {
                        Ok(trades) => (CallResult::Parsed(trades), None),
                        Err(e @ Error::TooManyTrades { .. }) => {
                            let note = e.to_string();
                            (CallResult::Fatal(e), Some(note))
                        }
                        Err(_) => (
                            CallResult::ParseFailure,
                            Some("normalization found no trade array".to_string()),
                        ),
                    },
                    Err(_) => (
                        CallResult::ParseFailure,
                        Some("unparseable model output".to_string()),
                    ),
                };

                let entry = self.log_entry(
                    user_id,
                    tier,
                    &model_id,
                    completion.tokens_in as i64,
                    completion.tokens_out as i64,
                    cost_cents,
                    latency_ms,
                    false,
                    input,
                    estimate,
                    error_note,
                );
                (result, entry)
            }
            Err(e) => {
                let entry = self.log_entry(
                    user_id,
                    tier,
                    &model_id,
                    0,
                    0,
                    0,
                    latency_ms,
                    false,
                    input,
                    estimate,
                    Some(e.to_string()),
                );
                (CallResult::Fatal(map_inference_error(e)), entry)
            }
        }
    }

    fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Lite => &self.inference.lite_model,
            _ => &self.inference.deep_model,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn log_entry(
        &self,
        user_id: UserId,
        tier: Tier,
        model_id: &str,
        tokens_in: i64,
        tokens_out: i64,
        cost_cents: i64,
        latency_ms: i64,
        cache_hit: bool,
        input: &ExtractionInput,
        estimate: u32,
        error: Option<String>,
    ) -> CostLogCreate {
        CostLogCreate {
            user_id,
            endpoint: EXTRACTION_ENDPOINT.to_string(),
            tier: tier.as_str().to_string(),
            model_id: model_id.to_string(),
            tokens_in,
            tokens_out,
            cost_cents,
            latency_ms,
            cache_hit,
            ocr_quality: input.ocr_confidence,
            estimated_trades: estimate as i32,
            error,
        }
    }
}

/// Upstream failures map onto the error taxonomy without ever triggering the
/// opposite tier.
fn map_inference_error(e: InferenceError) -> Error {
    match e {
        InferenceError::RateLimited => Error::UpstreamRateLimited,
        InferenceError::CreditsExhausted => Error::UpstreamCreditsExhausted,
        InferenceError::Http { status, detail } => Error::UpstreamHttp { status, detail },
        InferenceError::Timeout => Error::UpstreamHttp {
            status: 504,
            detail: "inference request timed out".to_string(),
        },
        InferenceError::Transport(detail) => Error::UpstreamHttp { status: 502, detail },
        InferenceError::Malformed => Error::UpstreamHttp {
            status: 502,
            detail: "response was not a chat completion".to_string(),
        },
    }
}
