//! Budget and cost history endpoints.

use crate::{
    AppState,
    api::models::usage::{BudgetResponse, CostLogEntryResponse, HistoryQuery},
    auth::CurrentUser,
    errors::Result,
};
use axum::{
    extract::{Query, State},
    response::Json,
};

/// Get current user's budget position
#[utoipa::path(
    get,
    path = "/usage/budget",
    tag = "usage",
    summary = "Get current month's AI budget position",
    responses(
        (status = 200, description = "Budget position", body = BudgetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Tradelens-User" = [])
    )
)]
pub async fn get_budget(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<BudgetResponse>> {
    let status = state.ledger.check_budget(current_user.id).await?;
    Ok(Json(BudgetResponse {
        spend_cents: status.spend_cents,
        budget_cents: status.budget_cents,
        percent_used: status.percent_used,
        band: status.band,
    }))
}

/// List current user's cost log entries
#[utoipa::path(
    get,
    path = "/usage/history",
    tag = "usage",
    summary = "List recent AI usage, newest first",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Cost log entries", body = [CostLogEntryResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Tradelens-User" = [])
    )
)]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<CostLogEntryResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let rows = state.store.list_cost_log(current_user.id, skip, limit).await?;
    Ok(Json(rows.into_iter().map(CostLogEntryResponse::from).collect()))
}
