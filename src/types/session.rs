//! Session types for the analytics engine
//!
//! A session is one visitor's continuous browsing activity, keyed by a
//! client-supplied opaque identifier. All timestamps are server-assigned
//! Unix epoch seconds; the client clock is never trusted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::is_zero;

/// Device descriptor, derived once from the first page view's user agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device: String,
    pub browser: String,
    pub os: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device: "unknown".to_string(),
            browser: "unknown".to_string(),
            os: "unknown".to_string(),
        }
    }
}

/// Location descriptor, set once from the first page view's request metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub country: String,
    /// Empty when unknown; excluded from distinct-city counts
    #[serde(default)]
    pub city: String,
}

impl Default for GeoInfo {
    fn default() -> Self {
        Self {
            country: "unknown".to_string(),
            city: String::new(),
        }
    }
}

/// A single page view inside a session; order is insertion order and is
/// significant for funnel/path analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "ts")]
    pub timestamp: i64,
    /// Seconds until the next activity in the session; 0 while the view
    /// is still the latest one
    #[serde(rename = "timeSpent", default, skip_serializing_if = "is_zero")]
    pub time_spent: i64,
}

/// A custom event inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
    #[serde(rename = "ts")]
    pub timestamp: i64,
}

/// A business-meaningful outcome attached to a session.
/// At most one per session; a later conversion replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    #[serde(rename = "conversionType")]
    pub conversion_type: String,
    pub value: f64,
    pub currency: String,
    #[serde(rename = "ts")]
    pub timestamp: i64,
}

/// One visitor's continuous browsing activity
///
/// `active` is never stored: it is always the predicate
/// `now - last_activity < threshold` (see [`Session::is_active`]), so it
/// cannot drift from the timestamp it reflects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: i64,
    #[serde(rename = "lastActivity")]
    pub last_activity: i64,
    #[serde(rename = "pageViews", default)]
    pub page_views: Vec<PageView>,
    #[serde(default)]
    pub events: Vec<TrackedEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<Conversion>,
    #[serde(default)]
    pub device: DeviceInfo,
    #[serde(default)]
    pub location: GeoInfo,
}

impl Session {
    /// Create a new session starting at the given timestamp
    pub fn new(session_id: String, timestamp: i64) -> Self {
        Self {
            session_id,
            started_at: timestamp,
            last_activity: timestamp,
            page_views: Vec::new(),
            events: Vec::new(),
            conversion: None,
            device: DeviceInfo::default(),
            location: GeoInfo::default(),
        }
    }

    /// Whether the session counts as active at `now` under the given
    /// recency threshold (seconds)
    pub fn is_active(&self, now: i64, threshold_secs: i64) -> bool {
        now - self.last_activity < threshold_secs
    }

    /// Total session duration in seconds
    pub fn duration(&self) -> i64 {
        self.last_activity - self.started_at
    }
}

/// Flattened session row for listings and exports: the page-view and event
/// sub-lists are stripped down to counts
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: i64,
    #[serde(rename = "lastActivity")]
    pub last_activity: i64,
    pub duration: i64,
    pub active: bool,
    #[serde(rename = "pageViews")]
    pub page_views: usize,
    pub events: usize,
    #[serde(rename = "hasConversion")]
    pub has_conversion: bool,
    #[serde(rename = "conversionValue", skip_serializing_if = "Option::is_none")]
    pub conversion_value: Option<f64>,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub country: String,
    pub city: String,
}

impl SessionSummary {
    /// Build a summary row; `active` is computed against `now`
    pub fn from_session(session: &Session, now: i64, threshold_secs: i64) -> Self {
        Self {
            session_id: session.session_id.clone(),
            started_at: session.started_at,
            last_activity: session.last_activity,
            duration: session.duration(),
            active: session.is_active(now, threshold_secs),
            page_views: session.page_views.len(),
            events: session.events.len(),
            has_conversion: session.conversion.is_some(),
            conversion_value: session.conversion.as_ref().map(|c| c.value),
            device: session.device.device.clone(),
            browser: session.device.browser.clone(),
            os: session.device.os.clone(),
            country: session.location.country.clone(),
            city: session.location.city.clone(),
        }
    }
}
