//! Overview and realtime endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{error_response, ApiResponse, RangeParams};
use crate::analytics::Deadline;
use crate::api::state::AppState;
use crate::types::DateRange;
use crate::utils::current_timestamp;

/// GET /api/analytics/overview - Range summary for the dashboard
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let deadline = Deadline::after(state.engine.config().query_timeout);
    match state
        .engine
        .overview(&range, current_timestamp(), &deadline)
    {
        Ok(stats) => Json(ApiResponse::new(stats, state.current_sequence_id())).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/analytics/realtime - Sliding-window counters
///
/// Recomputed on every request; no date parameters.
pub async fn get_realtime(State(state): State<Arc<AppState>>) -> Response {
    let stats = state.engine.realtime(current_timestamp());
    Json(ApiResponse::new(stats, state.current_sequence_id())).into_response()
}
