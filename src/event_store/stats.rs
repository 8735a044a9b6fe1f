//! Event Store statistics
//!
//! Reports on the state of the backing files: event counts by type, log and
//! snapshot sizes, and how far the log has run ahead of the last snapshot.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use super::store::{EventStoreConfig, EventStoreResult};

/// Statistics about the Event Store
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventStoreStats {
    /// Total number of events in the active log
    #[serde(rename = "eventCount")]
    pub event_count: usize,
    /// Size of the active event log in bytes
    #[serde(rename = "logSize")]
    pub log_size: u64,
    /// Size of the latest snapshot in bytes
    #[serde(rename = "snapshotSize")]
    pub snapshot_size: u64,
    /// Events by type in the active log
    #[serde(rename = "eventsByType")]
    pub events_by_type: HashMap<String, usize>,
    /// Last event ID
    #[serde(rename = "lastEventId")]
    pub last_event_id: u64,
    /// Last snapshot event ID
    #[serde(rename = "lastSnapshotEventId")]
    pub last_snapshot_event_id: u64,
    /// Events appended since the last snapshot
    #[serde(rename = "eventsSinceSnapshot")]
    pub events_since_snapshot: usize,
}

/// Collector for Event Store statistics
pub struct StatsCollector {
    config: EventStoreConfig,
}

impl StatsCollector {
    /// Create a new stats collector
    pub fn new(config: EventStoreConfig) -> Self {
        Self { config }
    }

    /// Collect all statistics
    pub fn collect(&self) -> EventStoreResult<EventStoreStats> {
        let mut stats = EventStoreStats::default();

        let events_path = self.config.events_path();
        if events_path.exists() {
            let (count, size, by_type, last_id) = self.analyze_event_file(&events_path)?;
            stats.event_count = count;
            stats.log_size = size;
            stats.events_by_type = by_type;
            stats.last_event_id = last_id;
        }

        let snapshot_path = self.config.latest_snapshot_path();
        if snapshot_path.exists() {
            stats.snapshot_size = fs::metadata(&snapshot_path)?.len();

            if let Some(id) = self.parse_snapshot_meta(&snapshot_path)? {
                stats.last_snapshot_event_id = id;
            }
        }

        if stats.last_event_id > stats.last_snapshot_event_id {
            stats.events_since_snapshot =
                (stats.last_event_id - stats.last_snapshot_event_id) as usize;
        }

        Ok(stats)
    }

    /// Analyze an event file
    fn analyze_event_file(
        &self,
        path: &Path,
    ) -> EventStoreResult<(usize, u64, HashMap<String, usize>, u64)> {
        let file = File::open(path)?;
        let metadata = fs::metadata(path)?;
        let size = metadata.len();
        let reader = BufReader::new(file);

        let mut count = 0;
        let mut by_type: HashMap<String, usize> = HashMap::new();
        let mut last_id = 0u64;

        for line_result in reader.lines() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            count += 1;

            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&line) {
                if let Some(id) = value.get("eventId").and_then(|v| v.as_u64()) {
                    if id > last_id {
                        last_id = id;
                    }
                }

                if let Some(type_str) = value.get("eventType").and_then(|v| v.as_str()) {
                    *by_type.entry(type_str.to_string()).or_insert(0) += 1;
                }
            }
        }

        Ok((count, size, by_type, last_id))
    }

    /// Parse snapshot metadata to get the last snapshotted event ID
    fn parse_snapshot_meta(&self, path: &Path) -> EventStoreResult<Option<u64>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        if let Some(Ok(line)) = reader.lines().next() {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&line) {
                if let Some(id) = value.get("last_event_id").and_then(|v| v.as_u64()) {
                    return Ok(Some(id));
                }
            }
        }

        Ok(None)
    }
}
