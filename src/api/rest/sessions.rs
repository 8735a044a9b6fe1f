//! Session listing endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{error_response, ApiError, ApiResponse, Paginated, PaginationParams};
use crate::analytics::export::{SessionFilter, SessionSort, SessionStatus, SortOrder};
use crate::api::state::AppState;
use crate::types::DateRange;
use crate::utils::current_timestamp;

/// Query parameters for the session listing
#[derive(Debug, Deserialize)]
pub struct SessionListParams {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// all | active | inactive
    pub status: Option<String>,
    /// Case-insensitive country filter
    pub country: Option<String>,
    /// started_at | last_activity | page_views
    #[serde(default = "default_sort")]
    pub sort: String,
    /// asc | desc
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit", alias = "pageSize")]
    pub limit: usize,
}

fn default_sort() -> String {
    "started_at".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

/// Build the shared filter/sort contract from query parameters; the export
/// endpoint goes through this same function so both row sets match
pub(crate) fn build_filter(
    start_date: Option<&str>,
    end_date: Option<&str>,
    status: Option<&str>,
    country: Option<&str>,
    sort: &str,
    order: &str,
) -> Result<SessionFilter, Response> {
    let range = match DateRange::parse_optional(start_date, end_date) {
        Ok(range) => range,
        Err(e) => return Err(error_response(&e)),
    };

    let status = match status {
        None => SessionStatus::All,
        Some(raw) => match SessionStatus::parse(raw) {
            Some(status) => status,
            None => {
                return Err(bad_request(format!("invalid status: '{}'", raw)));
            }
        },
    };

    let sort = match SessionSort::parse(sort) {
        Some(sort) => sort,
        None => return Err(bad_request(format!("invalid sort: '{}'", sort))),
    };

    let order = match SortOrder::parse(order) {
        Some(order) => order,
        None => return Err(bad_request(format!("invalid order: '{}'", order))),
    };

    Ok(SessionFilter {
        range,
        status,
        country: country.map(|c| c.to_string()),
        sort,
        order,
    })
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message))).into_response()
}

/// GET /api/analytics/sessions - Paginated session listing
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionListParams>,
) -> Response {
    let filter = match build_filter(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.status.as_deref(),
        params.country.as_deref(),
        &params.sort,
        &params.order,
    ) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let rows = state.engine.session_rows(&filter, current_timestamp());

    let paging = PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    Json(Paginated::slice(
        rows,
        paging.normalized_page(),
        paging.normalized_limit(),
        state.current_sequence_id(),
    ))
    .into_response()
}

/// GET /api/analytics/sessions/:id - Single session with full sub-lists
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    // URL decode the id (handles spaces and special chars)
    let decoded_id = urlencoding::decode(&id)
        .unwrap_or_else(|_| id.clone().into())
        .into_owned();

    match state.engine.get_session(&decoded_id) {
        Some(session) => {
            Json(ApiResponse::new(session, state.current_sequence_id())).into_response()
        }
        None => {
            let error = ApiError::not_found(format!("Session '{}' not found", decoded_id));
            (StatusCode::NOT_FOUND, Json(error)).into_response()
        }
    }
}
