//! Backing store statistics endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{error_response, ApiResponse};
use crate::api::state::AppState;

/// GET /api/store/stats - Event log and snapshot statistics
pub async fn get_store_stats(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.store_stats() {
        Ok(stats) => Json(ApiResponse::new(stats, state.current_sequence_id())).into_response(),
        Err(e) => error_response(&e),
    }
}
