//! Real-time windows
//!
//! Fixed sliding windows off `now`, recomputed on every call. Nothing here
//! is memoized: "real time" is a correctness requirement, not an
//! optimization target.

use std::collections::HashMap;

use crate::types::{CountryCount, PageCount, RealtimeStats};

use super::AnalyticsEngine;

const HOUR_SECS: i64 = 3600;
const DAY_SECS: i64 = 86_400;

const CURRENT_PAGES_LIMIT: usize = 10;
const GEO_DISTRIBUTION_LIMIT: usize = 5;

/// Sessions with activity in the last hour
pub(crate) fn active_sessions_last_hour(engine: &AnalyticsEngine, now: i64) -> usize {
    let sessions = engine.sessions.read().unwrap();
    sessions
        .values()
        .filter(|s| s.is_active(now, HOUR_SECS))
        .count()
}

/// Sessions started in the last 24 hours
pub(crate) fn sessions_last_24h(engine: &AnalyticsEngine, now: i64) -> usize {
    let sessions = engine.sessions.read().unwrap();
    sessions
        .values()
        .filter(|s| now - s.started_at < DAY_SECS)
        .count()
}

/// Page views from the last hour, by the view's own timestamp, ranked by URL
pub(crate) fn current_page_views(
    engine: &AnalyticsEngine,
    now: i64,
    limit: usize,
) -> Vec<PageCount> {
    let sessions = engine.sessions.read().unwrap();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for session in sessions.values() {
        for view in &session.page_views {
            if now - view.timestamp < HOUR_SECS {
                *counts.entry(view.url.clone()).or_insert(0) += 1;
            }
        }
    }

    let mut rows: Vec<PageCount> = counts
        .into_iter()
        .map(|(url, views)| PageCount { url, views })
        .collect();
    rows.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.url.cmp(&b.url)));
    rows.truncate(limit);
    rows
}

/// Country distribution among sessions active in the last hour
pub(crate) fn active_geo_distribution(
    engine: &AnalyticsEngine,
    now: i64,
    limit: usize,
) -> Vec<CountryCount> {
    let sessions = engine.sessions.read().unwrap();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for session in sessions.values().filter(|s| s.is_active(now, HOUR_SECS)) {
        *counts.entry(session.location.country.clone()).or_insert(0) += 1;
    }

    let mut rows: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, sessions)| CountryCount { country, sessions })
        .collect();
    rows.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| a.country.cmp(&b.country))
    });
    rows.truncate(limit);
    rows
}

/// Bundle for the realtime endpoint
pub(crate) fn realtime(engine: &AnalyticsEngine, now: i64) -> RealtimeStats {
    RealtimeStats {
        active_sessions_last_hour: active_sessions_last_hour(engine, now),
        sessions_last_24h: sessions_last_24h(engine, now),
        current_page_views: current_page_views(engine, now, CURRENT_PAGES_LIMIT),
        geo_distribution: active_geo_distribution(engine, now, GEO_DISTRIBUTION_LIMIT),
    }
}
