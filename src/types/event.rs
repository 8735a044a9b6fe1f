//! Event types for the append-only tracking log
//!
//! Every ingestion write is recorded as an immutable [`TrackingEvent`] before
//! it touches the projected session state. Replaying the log in event-id
//! order rebuilds the projection exactly.

use serde::{Deserialize, Serialize};

use crate::utils::current_timestamp;

/// Event types that can occur in the tracking log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEventType {
    /// A page view was recorded for a session
    PageViewRecorded,
    /// A custom event was recorded for a session
    EventRecorded,
    /// A conversion was recorded for a session
    ConversionRecorded,
}

impl std::fmt::Display for TrackingEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingEventType::PageViewRecorded => write!(f, "page_view_recorded"),
            TrackingEventType::EventRecorded => write!(f, "event_recorded"),
            TrackingEventType::ConversionRecorded => write!(f, "conversion_recorded"),
        }
    }
}

/// Data payload for PageViewRecorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewData {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "userAgent", default)]
    pub user_agent: String,
    #[serde(rename = "sourceAddress", default)]
    pub source_address: String,
    /// Geo hints forwarded by the tracking script (e.g. CDN headers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Data payload for EventRecorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomEventData {
    pub category: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

/// Data payload for ConversionRecorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionData {
    #[serde(rename = "conversionType")]
    pub conversion_type: String,
    pub value: f64,
    #[serde(default)]
    pub currency: String,
}

/// An immutable event in the tracking log
///
/// Events are the source of truth: the projected session map is derived by
/// replaying all events in order. Timestamps are assigned at ingestion time
/// so client clock skew can never reorder a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Type of event
    #[serde(rename = "eventType")]
    pub event_type: TrackingEventType,

    /// Unique, auto-incrementing event ID
    #[serde(rename = "eventId")]
    pub event_id: u64,

    /// Unix timestamp assigned at ingestion
    #[serde(rename = "ts")]
    pub timestamp: i64,

    /// Client-supplied opaque session identifier
    #[serde(rename = "sessionId")]
    pub session_id: String,

    /// Event-specific payload
    pub data: serde_json::Value,
}

impl TrackingEvent {
    /// Create a new event stamped with the current time
    pub fn new(
        event_type: TrackingEventType,
        event_id: u64,
        session_id: String,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            event_id,
            timestamp: current_timestamp(),
            session_id,
            data,
        }
    }

    /// Create a new event with an explicit timestamp (for replay tooling)
    pub fn with_timestamp(
        event_type: TrackingEventType,
        event_id: u64,
        timestamp: i64,
        session_id: String,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            event_id,
            timestamp,
            session_id,
            data,
        }
    }

    /// Parse the event data as a specific payload type
    pub fn parse_data<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Snapshot metadata - first line in snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Always "snapshot_meta" to identify this as metadata
    #[serde(rename = "type")]
    pub meta_type: String,

    /// Last event ID included in this snapshot
    pub last_event_id: u64,

    /// Timestamp when snapshot was created
    pub created_at: i64,

    /// Number of sessions in snapshot
    pub session_count: usize,

    /// Version of snapshot format (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl SnapshotMeta {
    /// Create new snapshot metadata
    pub fn new(last_event_id: u64, session_count: usize) -> Self {
        Self {
            meta_type: "snapshot_meta".to_string(),
            last_event_id,
            created_at: current_timestamp(),
            session_count,
            version: 1,
        }
    }

    /// Parse from JSON string (first line of snapshot file)
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Serialize to JSON string
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
