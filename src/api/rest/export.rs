//! Export endpoint
//!
//! Streams the same filtered/sorted row sets as the paginated listings,
//! unpaginated, as a JSON or CSV attachment. The `type` and date parameters
//! are validated before any engine state is touched.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::{error_response, sessions::build_filter};
use crate::analytics::export::{
    conversions_to_csv, pages_to_csv, sessions_to_csv, ExportFormat, ExportKind,
};
use crate::analytics::Deadline;
use crate::api::state::AppState;
use crate::types::{AnalyticsError, DateRange};
use crate::utils::current_timestamp;

/// Query parameters for the export endpoint
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(rename = "type")]
    pub export_type: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_sort() -> String {
    "started_at".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

/// GET /api/analytics/export
pub async fn export(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> Response {
    // Validate type and format before touching any engine state
    let kind = match ExportKind::parse(params.export_type.as_deref().unwrap_or("")) {
        Ok(kind) => kind,
        Err(e) => return error_response(&e),
    };
    let format = match ExportFormat::parse(params.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return error_response(&e),
    };

    match kind {
        ExportKind::Sessions => export_sessions(&state, &params, format),
        ExportKind::Pages => export_pages(&state, &params, format),
        ExportKind::Conversions => export_conversions(&state, &params, format),
    }
}

/// Same filter/sort path as `GET /api/analytics/sessions`, unpaginated
fn export_sessions(state: &AppState, params: &ExportParams, format: ExportFormat) -> Response {
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

    match format {
        ExportFormat::Json => attachment(ExportKind::Sessions, format, Json(rows).into_response()),
        ExportFormat::Csv => attachment(
            ExportKind::Sessions,
            format,
            sessions_to_csv(&rows).into_response(),
        ),
    }
}

fn export_pages(state: &AppState, params: &ExportParams, format: ExportFormat) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let deadline = Deadline::after(state.engine.config().query_timeout);
    // Full row set: the limit only applies to the dashboard ranking view
    let rows = match state.engine.page_analytics(&range, usize::MAX, &deadline) {
        Ok(rows) => rows,
        Err(e) => return error_response(&e),
    };

    match format {
        ExportFormat::Json => attachment(ExportKind::Pages, format, Json(rows).into_response()),
        ExportFormat::Csv => attachment(
            ExportKind::Pages,
            format,
            pages_to_csv(&rows).into_response(),
        ),
    }
}

fn export_conversions(state: &AppState, params: &ExportParams, format: ExportFormat) -> Response {
    let range = match DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&e),
    };

    let rows = state.engine.conversion_rows(&range);

    match format {
        ExportFormat::Json => {
            attachment(ExportKind::Conversions, format, Json(rows).into_response())
        }
        ExportFormat::Csv => attachment(
            ExportKind::Conversions,
            format,
            conversions_to_csv(&rows).into_response(),
        ),
    }
}

fn attachment(kind: ExportKind, format: ExportFormat, mut response: Response) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        kind.file_stem(),
        format.extension()
    );

    let headers: &mut HeaderMap = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => {
            eprintln!("Warning: invalid content-disposition: {}", e);
            return error_response(&AnalyticsError::InvalidExportType(
                "invalid export file name".to_string(),
            ));
        }
    }

    response
}
