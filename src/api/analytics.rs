//! Analytics read endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::analytics::{self, LinkAnalytics};

use super::handlers::AppState;
use super::response::{ApiError, ApiResponse};

const DEFAULT_DAYS: i64 = 30;
const MAX_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// Trend window length in days (default 30, clamped to 1..=365)
    pub days: Option<i64>,
    /// Include hourly/weekly/geography/device sections
    #[serde(default)]
    pub advanced: bool,
}

/// Analytics report for one link. Read-only: computed from the click log
/// and a reference "now", with no side effects.
pub async fn get_link_analytics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<LinkAnalytics>>, ApiError> {
    let link = state
        .storage
        .get_link(id)
        .await?
        .ok_or(ApiError::NotFound("Link"))?;

    let days = params.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    let events = state.storage.clicks_for_link(link.id, None).await?;

    let payload = analytics::report(&events, days, params.advanced, Utc::now());
    Ok(ApiResponse::ok(payload))
}
