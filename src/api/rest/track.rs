//! Ingestion endpoints
//!
//! Consumed by the client tracking script. Tracking must never break the
//! calling page: failures are logged server-side and surfaced as a generic
//! error with no internal detail.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::ApiError;
use crate::api::state::AppState;
use crate::types::{ConversionData, CustomEventData, PageViewData};

#[derive(Debug, Deserialize)]
pub struct TrackPageViewRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "userAgent", default)]
    pub user_agent: String,
    #[serde(rename = "sourceAddress", default)]
    pub source_address: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// POST /api/track/pageview
pub async fn track_page_view(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackPageViewRequest>,
) -> Response {
    let data = PageViewData {
        url: req.url,
        title: req.title,
        user_agent: req.user_agent,
        source_address: req.source_address,
        country: req.country,
        city: req.city,
    };

    respond(&state, state.engine.record_page_view(&req.session_id, data))
}

#[derive(Debug, Deserialize)]
pub struct TrackEventRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// POST /api/track/event
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackEventRequest>,
) -> Response {
    let data = CustomEventData {
        category: req.category,
        name: req.name,
        payload: req.payload,
    };

    respond(&state, state.engine.record_event(&req.session_id, data))
}

#[derive(Debug, Deserialize)]
pub struct TrackConversionRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "type")]
    pub conversion_type: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// POST /api/track/conversion
pub async fn track_conversion(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackConversionRequest>,
) -> Response {
    let data = ConversionData {
        conversion_type: req.conversion_type,
        value: req.value,
        currency: req.currency,
    };

    respond(&state, state.engine.record_conversion(&req.session_id, data))
}

fn respond<T>(state: &AppState, result: crate::types::AnalyticsResult<T>) -> Response {
    match result {
        Ok(_) => {
            let sequence_id = state.record_ingest();
            Json(json!({ "ok": true, "sequence_id": sequence_id })).into_response()
        }
        Err(e) => {
            // Fire-and-forget contract: log the detail, return a generic body
            eprintln!("Tracking error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("tracking failed")),
            )
                .into_response()
        }
    }
}
