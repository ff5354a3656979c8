//! Request/response models for the extraction endpoint.

use crate::extraction::ExtractedTrade;
use crate::types::Tier;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One screenshot submitted for trade extraction.
///
/// Either `image_base64` or a precomputed `image_fingerprint` must be
/// present. Fingerprint-only requests can only be served from cache or the
/// lite tier, since the deep tier needs the image itself.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ExtractionRequest {
    /// Base64-encoded screenshot
    pub image_base64: Option<String>,
    /// Precomputed content hash, in place of the image
    pub image_fingerprint: Option<String>,
    /// OCR text produced by the client-side OCR pass
    pub ocr_text: Option<String>,
    /// OCR confidence in [0, 1]
    pub ocr_confidence: Option<f32>,
    /// Broker name hint, currently informational only
    pub broker: Option<String>,
    /// User-drawn annotations on the screenshot
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Force the vision tier (user-initiated retry)
    #[serde(default)]
    pub force_deep_model: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Annotation {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractionResponse {
    pub trades: Vec<ExtractedTrade>,
    /// Which inference path produced this result
    pub tier: Tier,
    /// True when served from the result cache without an inference call
    pub cached: bool,
    pub model_id: String,
}
