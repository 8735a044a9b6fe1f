//! Integration tests for the analytics engine
//!
//! Covers the full flow from ingestion through the projection to the
//! aggregate queries, plus recovery after a restart.

use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};

use sitepulse::analytics::{AnalyticsEngine, Deadline, EngineConfig};
use sitepulse::event_store::EventStoreConfig;
use sitepulse::types::{
    AnalyticsError, ConversionData, CustomEventData, DateRange, PageViewData,
};
use sitepulse::utils::current_timestamp;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_data_dir() -> std::path::PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::path::PathBuf::from(format!(
        "target/test_analytics_{}_{}",
        std::process::id(),
        id
    ))
}

fn cleanup_dir(path: &std::path::Path) {
    let _ = fs::remove_dir_all(path);
}

fn engine_at(dir: &std::path::Path) -> AnalyticsEngine {
    let config = EngineConfig {
        store: EventStoreConfig::new(dir),
        ..EngineConfig::default()
    };
    AnalyticsEngine::with_config(config).expect("engine should start")
}

fn page_view(url: &str) -> PageViewData {
    PageViewData {
        url: url.to_string(),
        title: String::new(),
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0 Safari/537.36"
            .to_string(),
        source_address: "203.0.113.9".to_string(),
        country: None,
        city: None,
    }
}

fn page_view_from(url: &str, user_agent: &str, country: &str, city: &str) -> PageViewData {
    PageViewData {
        url: url.to_string(),
        title: String::new(),
        user_agent: user_agent.to_string(),
        source_address: "203.0.113.9".to_string(),
        country: Some(country.to_string()),
        city: if city.is_empty() {
            None
        } else {
            Some(city.to_string())
        },
    }
}

fn conversion(conversion_type: &str, value: f64) -> ConversionData {
    ConversionData {
        conversion_type: conversion_type.to_string(),
        value,
        currency: "USD".to_string(),
    }
}

fn custom_event(name: &str) -> CustomEventData {
    CustomEventData {
        category: "interaction".to_string(),
        name: name.to_string(),
        payload: serde_json::Value::Null,
    }
}

/// A range comfortably containing "now"
fn around_now() -> DateRange {
    let now = current_timestamp();
    DateRange::new(now - 3600, now + 3600).unwrap()
}

/// A range entirely in the past
fn long_ago() -> DateRange {
    DateRange::new(1_000_000, 2_000_000).unwrap()
}

#[test]
fn test_range_membership_is_inclusive_of_both_ends() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    engine.record_page_view("v1", page_view("/")).unwrap();
    engine.record_page_view("v2", page_view("/")).unwrap();

    let started = engine.get_session("v1").unwrap().started_at;

    // A degenerate [t, t] range still counts the session that started at t
    let exact = DateRange::new(started, started).unwrap();
    assert!(engine.count_sessions_in_range(&exact) >= 1);

    assert_eq!(engine.count_sessions_in_range(&around_now()), 2);
    assert_eq!(engine.count_sessions_in_range(&long_ago()), 0);

    cleanup_dir(&dir);
}

#[test]
fn test_conversion_rate_is_zero_for_empty_range() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    // No sessions at all
    assert_eq!(engine.conversion_rate(&around_now()), 0.0);

    // Sessions exist, but none in the queried range
    engine.record_page_view("v1", page_view("/")).unwrap();
    assert_eq!(engine.conversion_rate(&long_ago()), 0.0);

    cleanup_dir(&dir);
}

#[test]
fn test_top_pages_counts_and_ranking() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    // Scenario: one session viewing /a, /b, /a
    engine.record_page_view("x", page_view("/a")).unwrap();
    engine.record_page_view("x", page_view("/b")).unwrap();
    engine.record_page_view("x", page_view("/a")).unwrap();

    let rows = engine.top_pages(10, &Deadline::none()).unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].url, "/a");
    assert_eq!(rows[0].total_views, 2);
    assert_eq!(rows[0].unique_sessions, 1);

    assert_eq!(rows[1].url, "/b");
    assert_eq!(rows[1].total_views, 1);
    assert_eq!(rows[1].unique_sessions, 1);

    cleanup_dir(&dir);
}

#[test]
fn test_top_pages_idempotent_with_deterministic_ties() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    // /x and /y tie on views; /x must sort first by URL
    engine.record_page_view("v1", page_view("/y")).unwrap();
    engine.record_page_view("v2", page_view("/x")).unwrap();

    let first = engine.top_pages(10, &Deadline::none()).unwrap();
    let second = engine.top_pages(10, &Deadline::none()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].url, "/x");
    assert_eq!(first[1].url, "/y");

    cleanup_dir(&dir);
}

#[test]
fn test_conversion_rate_and_analytics() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    // Scenario: two sessions, one converts at value 50
    engine.record_page_view("v1", page_view("/")).unwrap();
    engine.record_page_view("v2", page_view("/")).unwrap();
    engine.record_conversion("v1", conversion("purchase", 50.0)).unwrap();

    let range = around_now();
    assert_eq!(engine.conversion_rate(&range), 50.0);

    let rows = engine.conversion_analytics(&range);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].conversion_type, "purchase");
    assert_eq!(rows[0].count, 1);
    assert_eq!(rows[0].total_value, 50.0);
    assert_eq!(rows[0].avg_value, 50.0);

    cleanup_dir(&dir);
}

#[test]
fn test_idle_session_not_active_past_threshold() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    engine.record_page_view("v1", page_view("/")).unwrap();
    let last_activity = engine.get_session("v1").unwrap().last_activity;

    // Still active just now
    assert_eq!(engine.count_active_sessions(last_activity), 1);
    // 31 minutes idle under the default 30-minute threshold: not active
    assert_eq!(engine.count_active_sessions(last_activity + 31 * 60), 0);

    cleanup_dir(&dir);
}

#[test]
fn test_funnel_counts_and_bounds() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    // One plain session, one with a custom event, one that converts
    // without ever firing a custom event
    engine.record_page_view("plain", page_view("/")).unwrap();

    engine.record_page_view("engaged", page_view("/")).unwrap();
    engine.record_event("engaged", custom_event("cta_click")).unwrap();

    engine.record_page_view("buyer", page_view("/")).unwrap();
    engine.record_conversion("buyer", conversion("purchase", 9.0)).unwrap();

    let funnel = engine.funnel_stats(&around_now());
    assert_eq!(funnel.total_sessions, 3);
    assert_eq!(funnel.sessions_with_events, 1);
    assert_eq!(funnel.conversions, 1);

    // Totals bound the later stages; the middle and final stages are not
    // ordered relative to each other (the buyer never fired an event)
    assert!(funnel.total_sessions >= funnel.sessions_with_events);
    assert!(funnel.total_sessions >= funnel.conversions);

    cleanup_dir(&dir);
}

#[test]
fn test_second_conversion_overwrites_first() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    engine.record_page_view("v1", page_view("/")).unwrap();
    engine.record_conversion("v1", conversion("trial", 0.0)).unwrap();
    engine.record_conversion("v1", conversion("purchase", 99.0)).unwrap();

    let session = engine.get_session("v1").unwrap();
    let recorded = session.conversion.unwrap();
    assert_eq!(recorded.conversion_type, "purchase");
    assert_eq!(recorded.value, 99.0);

    // Only the surviving conversion shows up in analytics
    let rows = engine.conversion_analytics(&around_now());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].conversion_type, "purchase");

    cleanup_dir(&dir);
}

#[test]
fn test_device_breakdown() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    let desktop = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0 Safari/537.36";
    let phone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Version/17.0 \
                 Mobile/15E148 Safari/604.1";

    engine
        .record_page_view("d1", page_view_from("/", desktop, "DE", ""))
        .unwrap();
    engine
        .record_page_view("d2", page_view_from("/", desktop, "DE", ""))
        .unwrap();
    engine
        .record_page_view("m1", page_view_from("/", phone, "US", ""))
        .unwrap();
    engine.record_conversion("d1", conversion("signup", 0.0)).unwrap();

    let rows = engine.device_stats(&around_now(), &Deadline::none()).unwrap();
    assert_eq!(rows.len(), 2);

    // Larger group first
    assert_eq!(rows[0].device, "desktop");
    assert_eq!(rows[0].browser, "Chrome");
    assert_eq!(rows[0].os, "Windows");
    assert_eq!(rows[0].sessions, 2);
    assert_eq!(rows[0].conversions, 1);
    assert_eq!(rows[0].conversion_rate, 50.0);

    assert_eq!(rows[1].device, "mobile");
    assert_eq!(rows[1].sessions, 1);
    assert_eq!(rows[1].conversion_rate, 0.0);

    cleanup_dir(&dir);
}

#[test]
fn test_geographic_breakdown() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    let ua = "Mozilla/5.0 (Windows NT 10.0) Chrome/120.0 Safari/537.36";
    engine
        .record_page_view("g1", page_view_from("/", ua, "DE", "Berlin"))
        .unwrap();
    engine
        .record_page_view("g2", page_view_from("/", ua, "DE", "Munich"))
        .unwrap();
    engine
        .record_page_view("g3", page_view_from("/", ua, "US", ""))
        .unwrap();
    engine.record_conversion("g2", conversion("signup", 0.0)).unwrap();

    let rows = engine
        .geographic_stats(&around_now(), 10, &Deadline::none())
        .unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].country, "DE");
    assert_eq!(rows[0].sessions, 2);
    assert_eq!(rows[0].unique_cities, 2);
    assert_eq!(rows[0].conversions, 1);
    assert_eq!(rows[0].conversion_rate, 50.0);

    assert_eq!(rows[1].country, "US");
    assert_eq!(rows[1].unique_cities, 0);

    // Limit truncates after ranking
    let top_one = engine
        .geographic_stats(&around_now(), 1, &Deadline::none())
        .unwrap();
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].country, "DE");

    cleanup_dir(&dir);
}

#[test]
fn test_realtime_windows_move_with_now() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    engine.record_page_view("v1", page_view("/live")).unwrap();
    let now = engine.get_session("v1").unwrap().last_activity;

    assert_eq!(engine.active_sessions_last_hour(now), 1);
    assert_eq!(engine.sessions_last_24h(now), 1);

    let views = engine.current_page_views(now, 10);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].url, "/live");
    assert_eq!(views[0].views, 1);

    // Two hours later the hour-window is empty, the day-window is not
    let later = now + 7200;
    assert_eq!(engine.active_sessions_last_hour(later), 0);
    assert!(engine.current_page_views(later, 10).is_empty());
    assert_eq!(engine.sessions_last_24h(later), 1);

    // A day and a half later everything has aged out
    assert_eq!(engine.sessions_last_24h(now + 36 * 3600), 0);

    cleanup_dir(&dir);
}

#[test]
fn test_page_analytics_scoped_to_range() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    engine.record_page_view("v1", page_view("/a")).unwrap();

    let in_range = engine
        .page_analytics(&around_now(), 10, &Deadline::none())
        .unwrap();
    assert_eq!(in_range.len(), 1);

    let out_of_range = engine
        .page_analytics(&long_ago(), 10, &Deadline::none())
        .unwrap();
    assert!(out_of_range.is_empty());

    cleanup_dir(&dir);
}

#[test]
fn test_expired_deadline_fails_whole_query() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    engine.record_page_view("v1", page_view("/")).unwrap();

    let deadline = Deadline::after(std::time::Duration::from_millis(0));
    std::thread::sleep(std::time::Duration::from_millis(2));

    assert!(matches!(
        engine.top_pages(10, &deadline),
        Err(AnalyticsError::QueryTimeout)
    ));

    cleanup_dir(&dir);
}

#[test]
fn test_restart_rebuilds_projection_from_log() {
    let dir = test_data_dir();

    {
        let engine = engine_at(&dir);
        engine.record_page_view("v1", page_view("/a")).unwrap();
        engine.record_page_view("v1", page_view("/b")).unwrap();
        engine.record_event("v1", custom_event("cta_click")).unwrap();
        engine.record_conversion("v1", conversion("purchase", 42.0)).unwrap();
        engine.record_page_view("v2", page_view("/a")).unwrap();
    }

    // No snapshot was written; a fresh engine replays the log
    let engine = engine_at(&dir);
    assert_eq!(engine.session_count(), 2);

    let session = engine.get_session("v1").unwrap();
    assert_eq!(session.page_views.len(), 2);
    assert_eq!(session.events.len(), 1);
    assert_eq!(session.conversion.as_ref().unwrap().value, 42.0);

    let rows = engine.top_pages(10, &Deadline::none()).unwrap();
    assert_eq!(rows[0].url, "/a");
    assert_eq!(rows[0].total_views, 2);
    assert_eq!(rows[0].unique_sessions, 2);

    cleanup_dir(&dir);
}

#[test]
fn test_restart_recovers_from_snapshot_plus_replay() {
    let dir = test_data_dir();

    let before = {
        let engine = engine_at(&dir);
        engine.record_page_view("v1", page_view("/a")).unwrap();
        engine.record_conversion("v1", conversion("signup", 0.0)).unwrap();
        engine.flush_snapshot().unwrap();

        // These land in the log after the snapshot
        engine.record_page_view("v2", page_view("/b")).unwrap();
        engine.record_page_view("v1", page_view("/c")).unwrap();

        (
            engine.get_session("v1").unwrap(),
            engine.get_session("v2").unwrap(),
        )
    };

    let engine = engine_at(&dir);
    assert_eq!(engine.session_count(), 2);
    assert_eq!(engine.get_session("v1").unwrap(), before.0);
    assert_eq!(engine.get_session("v2").unwrap(), before.1);

    cleanup_dir(&dir);
}

#[test]
fn test_export_rows_match_paginated_listing() {
    let dir = test_data_dir();
    let engine = engine_at(&dir);

    for i in 0..25 {
        engine
            .record_page_view(&format!("v{:02}", i), page_view("/"))
            .unwrap();
    }

    let filter = sitepulse::SessionFilter::default();
    let now = current_timestamp();

    // The export takes the whole row set; pagination slices the same set.
    // Element-for-element equality, including order.
    let export: Vec<String> = engine
        .session_rows(&filter, now)
        .into_iter()
        .map(|row| row.session_id)
        .collect();

    let mut paged: Vec<String> = Vec::new();
    let limit = 10;
    let rows = engine.session_rows(&filter, now);
    let pages = rows.len().div_ceil(limit);
    for page in 1..=pages {
        paged.extend(
            engine
                .session_rows(&filter, now)
                .into_iter()
                .skip((page - 1) * limit)
                .take(limit)
                .map(|row| row.session_id),
        );
    }

    assert_eq!(export.len(), 25);
    assert_eq!(paged, export);

    cleanup_dir(&dir);
}
