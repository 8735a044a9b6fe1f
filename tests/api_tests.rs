//! Integration tests for the HTTP API
//!
//! Drives the Axum router directly with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use sitepulse::analytics::{AnalyticsEngine, EngineConfig};
use sitepulse::api::http::create_router;
use sitepulse::api::state::AppState;
use sitepulse::event_store::EventStoreConfig;

fn test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = EngineConfig {
        store: EventStoreConfig::new(temp_dir.path()),
        ..EngineConfig::default()
    };
    let engine = Arc::new(AnalyticsEngine::with_config(config).unwrap());
    let state = Arc::new(AppState::new(engine));
    (create_router(state), temp_dir)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<(String, String)>, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn track_page_view(app: &Router, session_id: &str, url: &str) {
    let (status, body) = send(
        app,
        post_json(
            "/api/track/pageview",
            json!({
                "sessionId": session_id,
                "url": url,
                "title": "Page",
                "userAgent": "Mozilla/5.0 (Windows NT 10.0) Chrome/120.0 Safari/537.36",
                "country": "DE",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

/// A wide range around today, as ISO dates
fn range_query() -> String {
    let today = chrono::Utc::now().date_naive();
    let start = today - chrono::Days::new(1);
    let end = today + chrono::Days::new(1);
    format!("startDate={}&endDate={}", start, end)
}

#[tokio::test]
async fn test_ingest_then_overview() {
    let (app, _dir) = test_app();

    track_page_view(&app, "v1", "/").await;
    track_page_view(&app, "v1", "/pricing").await;
    track_page_view(&app, "v2", "/").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/track/conversion",
            json!({"sessionId": "v1", "type": "signup", "value": 50.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));

    let (status, body) = send(
        &app,
        get(&format!("/api/analytics/overview?{}", range_query())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["totalSessions"], json!(2));
    assert_eq!(data["pageViews"], json!(3));
    assert_eq!(data["conversions"], json!(1));
    assert_eq!(data["conversionRate"], json!(50.0));
    assert_eq!(data["topPages"][0]["url"], json!("/"));
    assert_eq!(data["topPages"][0]["totalViews"], json!(2));
    assert_eq!(data["topPages"][0]["uniqueSessions"], json!(2));

    // Ingest bumps the sequence counter; the response echoes it
    assert_eq!(body["sequence_id"], json!(4));
}

#[tokio::test]
async fn test_missing_range_is_rejected_before_query() {
    let (app, _dir) = test_app();

    let (status, body) = send(&app, get("/api/analytics/overview")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_DATE_RANGE"));

    let (status, body) = send(
        &app,
        get("/api/analytics/devices?startDate=2024-02-01&endDate=2024-01-01"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_DATE_RANGE"));

    let (status, body) = send(
        &app,
        get("/api/analytics/funnel?startDate=bogus&endDate=2024-01-01"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_DATE_RANGE"));
}

#[tokio::test]
async fn test_bogus_export_type_is_rejected() {
    let (app, _dir) = test_app();

    let (status, body) = send(
        &app,
        get(&format!("/api/analytics/export?type=bogus&{}", range_query())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_EXPORT_TYPE"));

    // A missing type must not silently default
    let (status, body) = send(&app, get("/api/analytics/export")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_EXPORT_TYPE"));
}

#[tokio::test]
async fn test_sessions_pagination_echo() {
    let (app, _dir) = test_app();

    for i in 0..25 {
        track_page_view(&app, &format!("v{:02}", i), "/").await;
    }

    let (status, body) = send(&app, get("/api/analytics/sessions?page=2&limit=10")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["page"], json!(2));
    assert_eq!(body["limit"], json!(10));
    assert_eq!(body["total"], json!(25));
    assert_eq!(body["pages"], json!(3));
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_export_equals_concatenated_pages() {
    let (app, _dir) = test_app();

    for i in 0..25 {
        track_page_view(&app, &format!("v{:02}", i), "/").await;
    }

    // Walk every page of the paginated listing
    let mut paged_ids: Vec<String> = Vec::new();
    for page in 1..=3 {
        let (status, body) = send(
            &app,
            get(&format!(
                "/api/analytics/sessions?page={}&limit=10&sort=started_at&order=asc",
                page
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        for row in body["data"].as_array().unwrap() {
            paged_ids.push(row["sessionId"].as_str().unwrap().to_string());
        }
    }

    // Same filters/sort, unpaginated
    let (status, body) = send(
        &app,
        get("/api/analytics/export?type=sessions&sort=started_at&order=asc"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let export_ids: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["sessionId"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(export_ids.len(), 25);
    assert_eq!(paged_ids, export_ids);
}

#[tokio::test]
async fn test_csv_export_headers_and_shape() {
    let (app, _dir) = test_app();

    track_page_view(&app, "v1", "/").await;
    track_page_view(&app, "v2", "/").await;

    let (status, headers, body) = send_raw(
        &app,
        get("/api/analytics/export?type=sessions&format=csv"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let content_type = headers
        .iter()
        .find(|(name, _)| name == "content-type")
        .map(|(_, value)| value.clone())
        .unwrap();
    assert!(content_type.starts_with("text/csv"));

    let disposition = headers
        .iter()
        .find(|(name, _)| name == "content-disposition")
        .map(|(_, value)| value.clone())
        .unwrap();
    assert_eq!(disposition, "attachment; filename=\"sessions.csv\"");

    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3); // header + 2 rows
    assert!(lines[0].starts_with("session_id,"));
}

#[tokio::test]
async fn test_session_detail_and_not_found() {
    let (app, _dir) = test_app();

    track_page_view(&app, "v1", "/docs").await;

    let (status, body) = send(&app, get("/api/analytics/sessions/v1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sessionId"], json!("v1"));
    assert_eq!(body["data"]["pageViews"][0]["url"], json!("/docs"));

    let (status, body) = send(&app, get("/api/analytics/sessions/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_realtime_counts_fresh_activity() {
    let (app, _dir) = test_app();

    track_page_view(&app, "v1", "/live").await;

    let (status, body) = send(&app, get("/api/analytics/realtime")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["activeSessionsLastHour"], json!(1));
    assert_eq!(data["sessionsLast24h"], json!(1));
    assert_eq!(data["currentPageViews"][0]["url"], json!("/live"));
    assert_eq!(data["geoDistribution"][0]["country"], json!("DE"));
}

#[tokio::test]
async fn test_breakdown_endpoints_respond() {
    let (app, _dir) = test_app();

    track_page_view(&app, "v1", "/").await;
    let (status, _) = send(
        &app,
        post_json(
            "/api/track/event",
            json!({"sessionId": "v1", "category": "cta", "name": "click"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let query = range_query();

    let (status, body) = send(&app, get(&format!("/api/analytics/devices?{}", query))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["sessions"], json!(1));

    let (status, body) = send(&app, get(&format!("/api/analytics/geography?{}", query))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["country"], json!("DE"));

    let (status, body) = send(&app, get(&format!("/api/analytics/funnel?{}", query))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalSessions"], json!(1));
    assert_eq!(body["data"]["sessionsWithEvents"], json!(1));

    let (status, body) = send(&app, get(&format!("/api/analytics/pages?{}", query))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["url"], json!("/"));

    let (status, body) = send(&app, get("/api/analytics/top-pages?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["totalViews"], json!(1));
}

#[tokio::test]
async fn test_store_stats_reports_log_state() {
    let (app, _dir) = test_app();

    track_page_view(&app, "v1", "/").await;
    track_page_view(&app, "v1", "/pricing").await;

    let (status, body) = send(&app, get("/api/store/stats")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["eventCount"], json!(2));
    assert_eq!(data["lastEventId"], json!(2));
    assert_eq!(data["eventsByType"]["page_view_recorded"], json!(2));
    assert!(data["logSize"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_invalid_sessions_filter_is_rejected() {
    let (app, _dir) = test_app();

    let (status, body) = send(&app, get("/api/analytics/sessions?status=paused")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("BAD_REQUEST"));

    let (status, body) = send(&app, get("/api/analytics/sessions?sort=age")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("BAD_REQUEST"));
}
