//! Dashboard and weekly report.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use farmasys_core::report::{DashboardSummary, WeeklyReport};
use farmasys_core::{Capability, REPORT_WINDOW_DAYS, TOP_PRODUCTS_LIMIT};

#[derive(Serialize)]
pub struct DashboardResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

#[derive(Serialize)]
pub struct WeeklyResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub report: WeeklyReport,
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    principal.require(Capability::ViewReports)?;

    let summary = state
        .db
        .reports()
        .dashboard(state.config.store.low_stock_threshold, Utc::now())
        .await?;

    Ok(Json(DashboardResponse { ok: true, summary }))
}

pub async fn weekly(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<WeeklyResponse>, ApiError> {
    principal.require(Capability::ViewReports)?;

    let report = state
        .db
        .reports()
        .weekly(Utc::now().date_naive(), REPORT_WINDOW_DAYS, TOP_PRODUCTS_LIMIT)
        .await?;

    Ok(Json(WeeklyResponse { ok: true, report }))
}
