//! OpenAPI documentation for the extraction API at `/api/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{handlers, models};
use crate::extraction::trade;
use crate::types::{BudgetBand, Tier};

/// Security scheme: the verified user id header injected by the auth proxy.
struct UserHeaderAddon;

impl Modify for UserHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "X-Tradelens-User".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Tradelens-User",
                    "Verified user id (UUID), injected by the authentication proxy.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tradelens extraction API",
        description = "AI-assisted extraction of trades from broker screenshots, \
                       with per-user budgets, rate limits and result caching."
    ),
    paths(
        handlers::extraction::extract_trades,
        handlers::usage::get_budget,
        handlers::usage::list_history,
        handlers::health::health,
    ),
    components(schemas(
        models::extraction::ExtractionRequest,
        models::extraction::ExtractionResponse,
        models::extraction::Annotation,
        models::usage::BudgetResponse,
        models::usage::CostLogEntryResponse,
        trade::ExtractedTrade,
        trade::Side,
        trade::TradeDuration,
        Tier,
        BudgetBand,
    )),
    modifiers(&UserHeaderAddon),
    tags(
        (name = "extraction", description = "Screenshot trade extraction"),
        (name = "usage", description = "Budget and cost history"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builds_and_lists_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/extractions"));
        assert!(spec.paths.paths.contains_key("/usage/budget"));
        assert!(spec.paths.paths.contains_key("/usage/history"));
        assert!(spec.paths.paths.contains_key("/health"));
    }
}
