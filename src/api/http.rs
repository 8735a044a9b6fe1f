//! HTTP server setup with Axum

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::rest::{breakdowns, export, overview, pages, sessions, store, track};
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - the tracking script posts from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Ingestion endpoints
        .route("/api/track/pageview", post(track::track_page_view))
        .route("/api/track/event", post(track::track_event))
        .route("/api/track/conversion", post(track::track_conversion))
        // Dashboard endpoints
        .route("/api/analytics/overview", get(overview::get_overview))
        .route("/api/analytics/realtime", get(overview::get_realtime))
        .route("/api/analytics/sessions", get(sessions::list_sessions))
        .route("/api/analytics/sessions/:id", get(sessions::get_session))
        .route("/api/analytics/pages", get(pages::get_page_analytics))
        .route("/api/analytics/top-pages", get(pages::get_top_pages))
        .route("/api/analytics/devices", get(breakdowns::get_device_stats))
        .route(
            "/api/analytics/geography",
            get(breakdowns::get_geographic_stats),
        )
        .route(
            "/api/analytics/conversions",
            get(breakdowns::get_conversion_analytics),
        )
        .route("/api/analytics/funnel", get(breakdowns::get_funnel_stats))
        .route("/api/analytics/export", get(export::export))
        // Store administration
        .route("/api/store/stats", get(store::get_store_stats))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
