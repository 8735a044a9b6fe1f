//! Page ranking endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{error_response, ApiResponse};
use crate::analytics::Deadline;
use crate::api::state::AppState;
use crate::types::DateRange;

/// Query parameters for ranged page analytics
#[derive(Debug, Deserialize)]
pub struct PageAnalyticsParams {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Query parameters for the all-time ranking
#[derive(Debug, Deserialize)]
pub struct TopPagesParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// GET /api/analytics/pages - Top pages within a date range
pub async fn get_page_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageAnalyticsParams>,
) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let deadline = Deadline::after(state.engine.config().query_timeout);
    match state
        .engine
        .page_analytics(&range, params.limit.clamp(1, 1000), &deadline)
    {
        Ok(rows) => Json(ApiResponse::new(rows, state.current_sequence_id())).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/analytics/top-pages - All-time top pages
pub async fn get_top_pages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopPagesParams>,
) -> Response {
    let deadline = Deadline::after(state.engine.config().query_timeout);
    match state
        .engine
        .top_pages(params.limit.clamp(1, 1000), &deadline)
    {
        Ok(rows) => Json(ApiResponse::new(rows, state.current_sequence_id())).into_response(),
        Err(e) => error_response(&e),
    }
}
