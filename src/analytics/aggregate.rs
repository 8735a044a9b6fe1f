//! Aggregate queries
//!
//! All operations here are read-only, recomputed on every call, and safe to
//! run concurrently with ingestion. Grouped scans check the caller's
//! [`Deadline`](super::Deadline) while iterating and fail whole on expiry.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::types::{
    AnalyticsResult, ConversionTypeStats, CountryStats, DateRange, DeviceInfo, DeviceStatsRow,
    FunnelStats, OverviewStats, PageStats,
};

use super::{AnalyticsEngine, Deadline};

/// Threshold for using parallel scans (session count)
const PARALLEL_SCAN_THRESHOLD: usize = 1000;

/// Zero-safe percentage: 0.0 whenever the denominator is 0
fn rate(conversions: usize, sessions: usize) -> f64 {
    if sessions == 0 {
        0.0
    } else {
        conversions as f64 / sessions as f64 * 100.0
    }
}

/// Sessions whose last activity is within the configured threshold of `now`
pub(crate) fn count_active_sessions(engine: &AnalyticsEngine, now: i64) -> usize {
    let threshold = engine.config.activity_threshold_secs;
    let sessions = engine.sessions.read().unwrap();
    sessions
        .values()
        .filter(|s| s.is_active(now, threshold))
        .count()
}

/// Sessions whose start time falls inside the range
pub(crate) fn count_sessions_in_range(engine: &AnalyticsEngine, range: &DateRange) -> usize {
    let guard = engine.sessions.read().unwrap();
    let sessions = &*guard;

    if sessions.len() > PARALLEL_SCAN_THRESHOLD {
        sessions
            .par_iter()
            .filter(|(_, s)| range.contains(s.started_at))
            .count()
    } else {
        sessions
            .values()
            .filter(|s| range.contains(s.started_at))
            .count()
    }
}

/// Converted sessions over sessions in range, as a percentage
pub(crate) fn conversion_rate(engine: &AnalyticsEngine, range: &DateRange) -> f64 {
    let sessions = engine.sessions.read().unwrap();

    let mut total = 0usize;
    let mut converted = 0usize;
    for session in sessions.values().filter(|s| range.contains(s.started_at)) {
        total += 1;
        if session.conversion.is_some() {
            converted += 1;
        }
    }

    rate(converted, total)
}

/// All-time top pages by view count
pub(crate) fn top_pages(
    engine: &AnalyticsEngine,
    limit: usize,
    deadline: &Deadline,
) -> AnalyticsResult<Vec<PageStats>> {
    page_stats(engine, None, limit, deadline)
}

/// Top pages restricted to views whose timestamp falls inside the range
pub(crate) fn page_analytics(
    engine: &AnalyticsEngine,
    range: &DateRange,
    limit: usize,
    deadline: &Deadline,
) -> AnalyticsResult<Vec<PageStats>> {
    page_stats(engine, Some(range), limit, deadline)
}

struct PageAgg {
    title: String,
    title_ts: i64,
    views: usize,
    sessions: HashSet<String>,
    total_time: i64,
}

fn page_stats(
    engine: &AnalyticsEngine,
    range: Option<&DateRange>,
    limit: usize,
    deadline: &Deadline,
) -> AnalyticsResult<Vec<PageStats>> {
    let sessions = engine.sessions.read().unwrap();
    let mut pages: HashMap<String, PageAgg> = HashMap::new();

    for session in sessions.values() {
        deadline.check()?;

        for view in &session.page_views {
            if let Some(range) = range {
                if !range.contains(view.timestamp) {
                    continue;
                }
            }

            let agg = pages.entry(view.url.clone()).or_insert_with(|| PageAgg {
                title: String::new(),
                title_ts: i64::MIN,
                views: 0,
                sessions: HashSet::new(),
                total_time: 0,
            });
            agg.views += 1;
            agg.sessions.insert(session.session_id.clone());
            agg.total_time += view.time_spent;

            // Latest title wins; the comparison is total so the outcome does
            // not depend on map iteration order
            if (view.timestamp, view.title.as_str()) > (agg.title_ts, agg.title.as_str()) {
                agg.title_ts = view.timestamp;
                agg.title = view.title.clone();
            }
        }
    }

    let mut rows: Vec<PageStats> = pages
        .into_iter()
        .map(|(url, agg)| PageStats {
            url,
            title: agg.title,
            total_views: agg.views,
            unique_sessions: agg.sessions.len(),
            avg_time_spent: if agg.views == 0 {
                0.0
            } else {
                agg.total_time as f64 / agg.views as f64
            },
        })
        .collect();

    // Descending by views; ties broken by URL for determinism
    rows.sort_by(|a, b| {
        b.total_views
            .cmp(&a.total_views)
            .then_with(|| a.url.cmp(&b.url))
    });
    rows.truncate(limit);

    Ok(rows)
}

struct DeviceAgg {
    sessions: usize,
    conversions: usize,
    total_duration: i64,
}

/// Breakdown by (device, browser, os) over sessions started in the range
pub(crate) fn device_stats(
    engine: &AnalyticsEngine,
    range: &DateRange,
    deadline: &Deadline,
) -> AnalyticsResult<Vec<DeviceStatsRow>> {
    let sessions = engine.sessions.read().unwrap();
    let mut groups: HashMap<DeviceInfo, DeviceAgg> = HashMap::new();

    for session in sessions.values().filter(|s| range.contains(s.started_at)) {
        deadline.check()?;

        let agg = groups.entry(session.device.clone()).or_insert(DeviceAgg {
            sessions: 0,
            conversions: 0,
            total_duration: 0,
        });
        agg.sessions += 1;
        if session.conversion.is_some() {
            agg.conversions += 1;
        }
        agg.total_duration += session.duration();
    }

    let mut rows: Vec<DeviceStatsRow> = groups
        .into_iter()
        .map(|(device, agg)| DeviceStatsRow {
            device: device.device,
            browser: device.browser,
            os: device.os,
            sessions: agg.sessions,
            conversions: agg.conversions,
            conversion_rate: rate(agg.conversions, agg.sessions),
            avg_session_duration: if agg.sessions == 0 {
                0.0
            } else {
                agg.total_duration as f64 / agg.sessions as f64
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.sessions.cmp(&a.sessions).then_with(|| {
            (a.device.as_str(), a.browser.as_str(), a.os.as_str()).cmp(&(
                b.device.as_str(),
                b.browser.as_str(),
                b.os.as_str(),
            ))
        })
    });

    Ok(rows)
}

struct CountryAgg {
    sessions: usize,
    cities: HashSet<String>,
    conversions: usize,
}

/// Breakdown by country over sessions started in the range
pub(crate) fn geographic_stats(
    engine: &AnalyticsEngine,
    range: &DateRange,
    limit: usize,
    deadline: &Deadline,
) -> AnalyticsResult<Vec<CountryStats>> {
    let sessions = engine.sessions.read().unwrap();
    let mut groups: HashMap<String, CountryAgg> = HashMap::new();

    for session in sessions.values().filter(|s| range.contains(s.started_at)) {
        deadline.check()?;

        let agg = groups
            .entry(session.location.country.clone())
            .or_insert_with(|| CountryAgg {
                sessions: 0,
                cities: HashSet::new(),
                conversions: 0,
            });
        agg.sessions += 1;
        if !session.location.city.is_empty() {
            agg.cities.insert(session.location.city.clone());
        }
        if session.conversion.is_some() {
            agg.conversions += 1;
        }
    }

    let mut rows: Vec<CountryStats> = groups
        .into_iter()
        .map(|(country, agg)| CountryStats {
            country,
            sessions: agg.sessions,
            unique_cities: agg.cities.len(),
            conversions: agg.conversions,
            conversion_rate: rate(agg.conversions, agg.sessions),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| a.country.cmp(&b.country))
    });
    rows.truncate(limit);

    Ok(rows)
}

/// The three funnel stages, counted independently over the same range.
///
/// Events and conversions only ever attach to a projected session, so
/// `total_sessions` bounds the other two; `sessions_with_events` and
/// `conversions` are not ordered relative to each other (a session may
/// convert without any custom event).
pub(crate) fn funnel_stats(engine: &AnalyticsEngine, range: &DateRange) -> FunnelStats {
    let sessions = engine.sessions.read().unwrap();

    let mut total = 0usize;
    let mut with_events = 0usize;
    let mut conversions = 0usize;

    for session in sessions.values().filter(|s| range.contains(s.started_at)) {
        total += 1;
        if !session.events.is_empty() {
            with_events += 1;
        }
        if session.conversion.is_some() {
            conversions += 1;
        }
    }

    FunnelStats {
        total_sessions: total,
        sessions_with_events: with_events,
        conversions,
    }
}

struct ConversionAgg {
    count: usize,
    total_value: f64,
}

/// Group conversions by type; scoped by the conversion's own timestamp
pub(crate) fn conversion_analytics(
    engine: &AnalyticsEngine,
    range: &DateRange,
) -> Vec<ConversionTypeStats> {
    let sessions = engine.sessions.read().unwrap();
    let mut groups: HashMap<String, ConversionAgg> = HashMap::new();

    for session in sessions.values() {
        if let Some(conversion) = &session.conversion {
            if !range.contains(conversion.timestamp) {
                continue;
            }
            let agg = groups
                .entry(conversion.conversion_type.clone())
                .or_insert(ConversionAgg {
                    count: 0,
                    total_value: 0.0,
                });
            agg.count += 1;
            agg.total_value += conversion.value;
        }
    }

    let mut rows: Vec<ConversionTypeStats> = groups
        .into_iter()
        .map(|(conversion_type, agg)| ConversionTypeStats {
            conversion_type,
            count: agg.count,
            total_value: agg.total_value,
            avg_value: if agg.count == 0 {
                0.0
            } else {
                agg.total_value / agg.count as f64
            },
        })
        .collect();

    rows.sort_by(|a, b| a.conversion_type.cmp(&b.conversion_type));
    rows
}

/// Dashboard summary for a range
pub(crate) fn overview(
    engine: &AnalyticsEngine,
    range: &DateRange,
    now: i64,
    deadline: &Deadline,
) -> AnalyticsResult<OverviewStats> {
    let (total_sessions, page_views, conversions) = {
        let sessions = engine.sessions.read().unwrap();

        let mut total = 0usize;
        let mut conversions = 0usize;
        for session in sessions.values().filter(|s| range.contains(s.started_at)) {
            total += 1;
            if session.conversion.is_some() {
                conversions += 1;
            }
        }

        let page_views = sessions
            .values()
            .flat_map(|s| s.page_views.iter())
            .filter(|v| range.contains(v.timestamp))
            .count();

        (total, page_views, conversions)
    };

    Ok(OverviewStats {
        total_sessions,
        page_views,
        active_sessions: count_active_sessions(engine, now),
        conversions,
        conversion_rate: rate(conversions, total_sessions),
        top_pages: page_stats(engine, Some(range), 5, deadline)?,
    })
}
