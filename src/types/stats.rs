//! Aggregate result rows
//!
//! These are ephemeral, computed values: never persisted, recomputed on
//! every query. Each struct is one grouping key plus its numeric measures.

use serde::Serialize;

/// Per-URL page statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageStats {
    pub url: String,
    pub title: String,
    #[serde(rename = "totalViews")]
    pub total_views: usize,
    #[serde(rename = "uniqueSessions")]
    pub unique_sessions: usize,
    #[serde(rename = "avgTimeSpent")]
    pub avg_time_spent: f64,
}

/// Per-(device, browser, os) statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatsRow {
    pub device: String,
    pub browser: String,
    pub os: String,
    pub sessions: usize,
    pub conversions: usize,
    #[serde(rename = "conversionRate")]
    pub conversion_rate: f64,
    #[serde(rename = "avgSessionDuration")]
    pub avg_session_duration: f64,
}

/// Per-country statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStats {
    pub country: String,
    pub sessions: usize,
    #[serde(rename = "uniqueCities")]
    pub unique_cities: usize,
    pub conversions: usize,
    #[serde(rename = "conversionRate")]
    pub conversion_rate: f64,
}

/// The three funnel stages, counted independently over the same range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunnelStats {
    #[serde(rename = "totalSessions")]
    pub total_sessions: usize,
    #[serde(rename = "sessionsWithEvents")]
    pub sessions_with_events: usize,
    pub conversions: usize,
}

/// Per-conversion-type statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionTypeStats {
    #[serde(rename = "conversionType")]
    pub conversion_type: String,
    pub count: usize,
    #[serde(rename = "totalValue")]
    pub total_value: f64,
    #[serde(rename = "avgValue")]
    pub avg_value: f64,
}

/// Dashboard summary for a date range
#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    #[serde(rename = "totalSessions")]
    pub total_sessions: usize,
    #[serde(rename = "pageViews")]
    pub page_views: usize,
    #[serde(rename = "activeSessions")]
    pub active_sessions: usize,
    pub conversions: usize,
    #[serde(rename = "conversionRate")]
    pub conversion_rate: f64,
    #[serde(rename = "topPages")]
    pub top_pages: Vec<PageStats>,
}

/// URL view count for real-time rankings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCount {
    pub url: String,
    pub views: usize,
}

/// Country session count for real-time rankings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub sessions: usize,
}

/// Bundle returned by the realtime endpoint; recomputed on every call
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeStats {
    #[serde(rename = "activeSessionsLastHour")]
    pub active_sessions_last_hour: usize,
    #[serde(rename = "sessionsLast24h")]
    pub sessions_last_24h: usize,
    #[serde(rename = "currentPageViews")]
    pub current_page_views: Vec<PageCount>,
    #[serde(rename = "geoDistribution")]
    pub geo_distribution: Vec<CountryCount>,
}
