//! Device, geography, conversion, and funnel endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{error_response, ApiResponse, RangeParams};
use crate::analytics::Deadline;
use crate::api::state::AppState;
use crate::types::DateRange;

/// GET /api/analytics/devices - Breakdown by (device, browser, os)
pub async fn get_device_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let deadline = Deadline::after(state.engine.config().query_timeout);
    match state.engine.device_stats(&range, &deadline) {
        Ok(rows) => Json(ApiResponse::new(rows, state.current_sequence_id())).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Query parameters for the geography breakdown
#[derive(Debug, Deserialize)]
pub struct GeographyParams {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default = "default_geo_limit")]
    pub limit: usize,
}

fn default_geo_limit() -> usize {
    10
}

/// GET /api/analytics/geography - Breakdown by country
pub async fn get_geographic_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeographyParams>,
) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let deadline = Deadline::after(state.engine.config().query_timeout);
    match state
        .engine
        .geographic_stats(&range, params.limit.clamp(1, 1000), &deadline)
    {
        Ok(rows) => Json(ApiResponse::new(rows, state.current_sequence_id())).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/analytics/conversions - Conversions grouped by type
pub async fn get_conversion_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let rows = state.engine.conversion_analytics(&range);
    Json(ApiResponse::new(rows, state.current_sequence_id())).into_response()
}

/// GET /api/analytics/funnel - Total / with-events / converted counts
pub async fn get_funnel_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let stats = state.engine.funnel_stats(&range);
    Json(ApiResponse::new(stats, state.current_sequence_id())).into_response()
}
