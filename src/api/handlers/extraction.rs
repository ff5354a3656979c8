//! The extraction endpoint.

use crate::{
    AppState,
    api::models::extraction::{ExtractionRequest, ExtractionResponse},
    auth::CurrentUser,
    errors::{Error, Result},
    extraction::ExtractionInput,
    types::abbrev_uuid,
};
use axum::{extract::State, response::Json};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Extract trades from a screenshot
#[utoipa::path(
    post,
    path = "/extractions",
    tag = "extraction",
    summary = "Extract trades from a screenshot",
    description = "Run the tiered AI extraction pipeline over a trading screenshot. \
                   Results are cached by image fingerprint; repeated submissions of \
                   the same image are served for free.",
    request_body = ExtractionRequest,
    responses(
        (status = 200, description = "Extracted trades", body = ExtractionResponse),
        (status = 400, description = "Invalid input (oversized image, missing image data, too many trades)"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Monthly AI budget exhausted"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Upstream inference failure"),
    ),
    security(
        ("X-Tradelens-User" = [])
    )
)]
pub async fn extract_trades(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ExtractionRequest>,
) -> Result<Json<ExtractionResponse>> {
    if let Some(confidence) = request.ocr_confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::BadRequest {
                message: format!("ocr_confidence must be within [0, 1], got {confidence}"),
            });
        }
    }

    // Fingerprint the image ourselves when it is present; trust the caller's
    // precomputed fingerprint otherwise.
    let fingerprint = match (&request.image_base64, &request.image_fingerprint) {
        (Some(image), _) => {
            let bytes = STANDARD.decode(image).map_err(|e| Error::BadRequest {
                message: format!("image_base64 is not valid base64: {e}"),
            })?;
            let max = state.config.extraction.max_image_bytes;
            if bytes.len() > max {
                return Err(Error::OversizedInput {
                    size: bytes.len(),
                    max,
                });
            }
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            format!("{:x}", hasher.finalize())
        }
        (None, Some(fingerprint)) if !fingerprint.trim().is_empty() => {
            fingerprint.trim().to_string()
        }
        _ => {
            return Err(Error::BadRequest {
                message: "Either image_base64 or image_fingerprint is required".to_string(),
            });
        }
    };

    tracing::debug!(
        user_id = %abbrev_uuid(&current_user.id),
        fingerprint = %fingerprint,
        has_ocr = request.ocr_text.is_some(),
        force_deep = request.force_deep_model,
        "Extraction request accepted"
    );

    let outcome = state
        .router
        .extract(
            current_user.id,
            ExtractionInput {
                fingerprint,
                image_base64: request.image_base64,
                ocr_text: request.ocr_text,
                ocr_confidence: request.ocr_confidence,
                force_deep: request.force_deep_model,
            },
        )
        .await?;

    Ok(Json(ExtractionResponse {
        trades: outcome.trades,
        tier: outcome.tier,
        cached: outcome.cached,
        model_id: outcome.model_id,
    }))
}
