//! REST API module for HTTP endpoints
//!
//! Ingestion endpoints (tracking script):
//! - `POST /api/track/pageview` / `event` / `conversion`
//!
//! Dashboard endpoints:
//! - `GET /api/analytics/overview` - Range summary
//! - `GET /api/analytics/realtime` - Sliding-window counters
//! - `GET /api/analytics/sessions` - Paginated session listing
//! - `GET /api/analytics/sessions/:id` - Single session
//! - `GET /api/analytics/pages` / `top-pages` - Page rankings
//! - `GET /api/analytics/devices` / `geography` / `conversions` / `funnel`
//! - `GET /api/analytics/export` - Unpaginated CSV/JSON export
//! - `GET /api/store/stats` - Backing store statistics

pub mod breakdowns;
pub mod export;
pub mod overview;
pub mod pages;
pub mod sessions;
pub mod store;
pub mod track;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::AnalyticsError;

/// Common pagination parameters (1-based page)
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    /// Page number, starting at 1
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size (default: 20, max: 1000)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

impl PaginationParams {
    /// Normalize limit to 1..=1000
    pub fn normalized_limit(&self) -> usize {
        self.limit.clamp(1, 1000)
    }

    /// Normalize page to at least 1
    pub fn normalized_page(&self) -> usize {
        self.page.max(1)
    }
}

/// Common `startDate`/`endDate` query parameters
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Current sequence ID for cache invalidation
    pub sequence_id: u64,
    /// Total count (for paginated responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, sequence_id: u64) -> Self {
        Self {
            data,
            sequence_id,
            total: None,
        }
    }
}

/// Paginated response: the page slice plus the echoed paging parameters
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
    pub sequence_id: u64,
}

impl<T> Paginated<T> {
    /// Slice one page out of the full row set
    pub fn slice(rows: Vec<T>, page: usize, limit: usize, sequence_id: u64) -> Self {
        let total = rows.len();
        let pages = total.div_ceil(limit);
        let data: Vec<T> = rows
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Self {
            data,
            page,
            limit,
            total,
            pages,
            sequence_id,
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// Map an engine error to a dashboard-facing response
///
/// Caller errors echo their message; store failures are replaced with a
/// generic message so raw store error text never reaches the UI.
pub fn error_response(err: &AnalyticsError) -> Response {
    let (status, body) = match err {
        AnalyticsError::InvalidDateRange(msg) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_DATE_RANGE", msg.clone()),
        ),
        AnalyticsError::InvalidExportType(t) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_EXPORT_TYPE", format!("unsupported export: '{}'", t)),
        ),
        AnalyticsError::UnknownSession(id) => (
            StatusCode::NOT_FOUND,
            ApiError::new("UNKNOWN_SESSION", format!("unknown session: {}", id)),
        ),
        AnalyticsError::QueryTimeout => (
            StatusCode::GATEWAY_TIMEOUT,
            ApiError::new("QUERY_TIMEOUT", "query took too long, retry with a narrower range"),
        ),
        AnalyticsError::Store(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("STORE_UNAVAILABLE", "analytics store unavailable, retry shortly"),
        ),
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_slice() {
        let rows: Vec<u32> = (0..45).collect();
        let page = Paginated::slice(rows, 2, 20, 7);

        assert_eq!(page.data.len(), 20);
        assert_eq!(page.data[0], 20);
        assert_eq!(page.page, 2);
        assert_eq!(page.total, 45);
        assert_eq!(page.pages, 3);
        assert_eq!(page.sequence_id, 7);
    }

    #[test]
    fn test_paginated_slice_past_end() {
        let rows: Vec<u32> = (0..5).collect();
        let page = Paginated::slice(rows, 9, 20, 0);

        assert!(page.data.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn test_normalized_params() {
        let params = PaginationParams { page: 0, limit: 5000 };
        assert_eq!(params.normalized_page(), 1);
        assert_eq!(params.normalized_limit(), 1000);
    }
}
