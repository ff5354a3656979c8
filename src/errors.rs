use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Error taxonomy for the extraction service.
///
/// `IncompleteExtraction` is deliberately absent: an incomplete lite attempt
/// is an internal routing condition that is always resolved by the single
/// deep fallback and never surfaced to callers. It lives in
/// [`crate::extraction::router::LiteOutcome`] instead.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Request identity missing or unusable
    #[error("Not authenticated")]
    Unauthorized { message: String },

    /// One of this service's own sliding-window caps was exceeded
    #[error("{message}")]
    RateLimited { message: String },

    /// The user's monthly AI budget does not permit this request
    #[error("{message}")]
    BudgetBlocked { message: String },

    /// The inference endpoint returned HTTP 429
    #[error("AI provider rate limit exceeded")]
    UpstreamRateLimited,

    /// The inference endpoint returned HTTP 402
    #[error("AI provider credits exhausted")]
    UpstreamCreditsExhausted,

    /// The inference endpoint returned any other non-2xx status (or timed out)
    #[error("AI provider request failed with status {status}")]
    UpstreamHttp { status: u16, detail: String },

    /// All four JSON repair strategies failed on the model output
    #[error("Model output could not be parsed")]
    UnparseableOutput,

    /// More trades normalized from one image than the per-image cap allows
    #[error("Extracted {count} trades from one image (limit {max})")]
    TooManyTrades { count: usize, max: usize },

    /// Input image larger than the configured byte cap
    #[error("Image is {size} bytes (limit {max})")]
    OversizedInput { size: usize, max: usize },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::RateLimited { .. } | Error::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::BudgetBlocked { .. } | Error::UpstreamCreditsExhausted => StatusCode::PAYMENT_REQUIRED,
            Error::UpstreamHttp { .. } | Error::UnparseableOutput => StatusCode::INTERNAL_SERVER_ERROR,
            Error::TooManyTrades { .. } | Error::OversizedInput { .. } | Error::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Database(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized { .. } => "Authentication required".to_string(),
            Error::RateLimited { message } | Error::BudgetBlocked { message } | Error::BadRequest { message } => {
                message.clone()
            }
            Error::UpstreamRateLimited => "AI provider rate limit exceeded, try later".to_string(),
            Error::UpstreamCreditsExhausted => "AI provider credits exhausted".to_string(),
            Error::UpstreamHttp { status, .. } => {
                format!("AI provider request failed (upstream status {status})")
            }
            Error::UnparseableOutput => "The AI model returned output that could not be parsed".to_string(),
            Error::TooManyTrades { count, max } => {
                format!("Extracted {count} trades from one image, which exceeds the limit of {max}")
            }
            Error::OversizedInput { size, max } => {
                format!("Image is {size} bytes, which exceeds the limit of {max} bytes")
            }
            Error::Database(_) => "Database error occurred".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Remedial-action hint included in the response body where one exists.
    pub fn details(&self) -> Option<&'static str> {
        match self {
            Error::Unauthorized { .. } => Some("Sign in again."),
            Error::RateLimited { .. } => Some("Wait for the window to reset before retrying."),
            Error::BudgetBlocked { .. } => Some("Your monthly AI budget resets at the start of next month."),
            Error::UpstreamRateLimited => Some("The AI provider is busy; try again in a minute."),
            Error::UpstreamCreditsExhausted => Some("Contact support to restore AI provider credits."),
            Error::UnparseableOutput => Some("Try a clearer screenshot."),
            Error::TooManyTrades { .. } => Some("Crop the screenshot so it shows fewer trades."),
            Error::OversizedInput { .. } => Some("Resize or crop the image and try again."),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(_) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::UpstreamHttp { status, detail } => {
                tracing::error!(status, detail, "Upstream inference failure");
            }
            Error::UpstreamRateLimited | Error::UpstreamCreditsExhausted | Error::UnparseableOutput => {
                tracing::warn!("Upstream error: {}", self);
            }
            Error::RateLimited { .. } | Error::BudgetBlocked { .. } => {
                tracing::info!("Request gated: {}", self);
            }
            Error::Unauthorized { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::TooManyTrades { .. } | Error::OversizedInput { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = match self.details() {
            Some(details) => json!({ "error": self.user_message(), "details": details }),
            None => json!({ "error": self.user_message() }),
        };

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
