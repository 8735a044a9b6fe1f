//! Event Store - append-only tracking log
//!
//! The EventStore manages the append-only event log and provides
//! functionality for loading events back so the session projection can be
//! rebuilt on startup.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::types::{TrackingEvent, TrackingEventType};

/// Configuration for the EventStore
#[derive(Debug, Clone)]
pub struct EventStoreConfig {
    /// Path to the data directory
    pub data_dir: PathBuf,
    /// Threshold for creating snapshots (number of events)
    pub snapshot_threshold: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_threshold: 1000,
        }
    }
}

impl EventStoreConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get path to events.jsonl
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("events.jsonl")
    }

    /// Get path to snapshots directory
    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    /// Get path to latest snapshot
    pub fn latest_snapshot_path(&self) -> PathBuf {
        self.snapshots_dir().join("latest.jsonl")
    }

    /// Get path to previous snapshot (backup)
    pub fn previous_snapshot_path(&self) -> PathBuf {
        self.snapshots_dir().join("previous.jsonl")
    }
}

/// Result type for EventStore operations
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors that can occur in EventStore operations
#[derive(Debug)]
pub enum EventStoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidEvent(String),
    SnapshotCorrupted(String),
}

impl std::fmt::Display for EventStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStoreError::Io(e) => write!(f, "IO error: {}", e),
            EventStoreError::Json(e) => write!(f, "JSON error: {}", e),
            EventStoreError::InvalidEvent(msg) => write!(f, "Invalid event: {}", msg),
            EventStoreError::SnapshotCorrupted(msg) => write!(f, "Snapshot corrupted: {}", msg),
        }
    }
}

impl std::error::Error for EventStoreError {}

impl From<std::io::Error> for EventStoreError {
    fn from(e: std::io::Error) -> Self {
        EventStoreError::Io(e)
    }
}

impl From<serde_json::Error> for EventStoreError {
    fn from(e: serde_json::Error) -> Self {
        EventStoreError::Json(e)
    }
}

/// The EventStore manages the append-only event log
pub struct EventStore {
    config: EventStoreConfig,
    /// Next event ID to assign
    next_event_id: u64,
    /// Number of events since last snapshot
    events_since_snapshot: usize,
    /// Last event ID included in most recent snapshot
    last_snapshot_event_id: u64,
}

impl EventStore {
    /// Create a new EventStore with default config
    pub fn new() -> Self {
        Self::with_config(EventStoreConfig::default())
    }

    /// Create a new EventStore with custom config
    pub fn with_config(config: EventStoreConfig) -> Self {
        Self {
            config,
            next_event_id: 1,
            events_since_snapshot: 0,
            last_snapshot_event_id: 0,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    /// Get the next event ID (without incrementing)
    pub fn next_event_id(&self) -> u64 {
        self.next_event_id
    }

    /// Get the highest event ID appended so far (0 when empty)
    pub fn last_event_id(&self) -> u64 {
        self.next_event_id - 1
    }

    /// Get events since last snapshot
    pub fn events_since_snapshot(&self) -> usize {
        self.events_since_snapshot
    }

    /// Check if snapshot should be created
    pub fn should_snapshot(&self) -> bool {
        self.events_since_snapshot >= self.config.snapshot_threshold
    }

    /// Append an event to the event log
    ///
    /// This is the core write operation. Events are appended atomically
    /// with fsync to ensure durability.
    pub fn append_event(&mut self, event: &TrackingEvent) -> EventStoreResult<u64> {
        let events_path = self.config.events_path();

        // Ensure parent directory exists
        if let Some(parent) = events_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Open file in append mode
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)?;

        // Serialize and write
        let json_line = event.to_json_line()?;
        writeln!(file, "{}", json_line)?;

        // Sync to disk for durability
        file.sync_all()?;

        // Update internal state
        let event_id = event.event_id;
        if event_id >= self.next_event_id {
            self.next_event_id = event_id + 1;
        }
        self.events_since_snapshot += 1;

        Ok(event_id)
    }

    /// Create a new event stamped with the ingestion time and append it
    pub fn create_and_append(
        &mut self,
        event_type: TrackingEventType,
        session_id: &str,
        data: serde_json::Value,
    ) -> EventStoreResult<TrackingEvent> {
        let event_id = self.next_event_id;
        self.next_event_id += 1;

        let event = TrackingEvent::new(event_type, event_id, session_id.to_string(), data);
        self.append_event(&event)?;

        Ok(event)
    }

    /// Load all events from the event log
    pub fn load_events(&self) -> EventStoreResult<Vec<TrackingEvent>> {
        let events_path = self.config.events_path();

        if !events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&events_path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match TrackingEvent::from_json_line(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse event at line {}: {}",
                        line_num + 1,
                        e
                    );
                    // Continue loading other events
                }
            }
        }

        Ok(events)
    }

    /// Load events after a specific event ID
    ///
    /// Used for replaying events after loading a snapshot.
    pub fn load_events_after(&self, after_event_id: u64) -> EventStoreResult<Vec<TrackingEvent>> {
        let all_events = self.load_events()?;
        Ok(all_events
            .into_iter()
            .filter(|e| e.event_id > after_event_id)
            .collect())
    }

    /// Position the id counters after loading a snapshot
    pub fn restore_from_snapshot(&mut self, last_snapshot_event_id: u64) {
        self.last_snapshot_event_id = last_snapshot_event_id;
        self.next_event_id = last_snapshot_event_id + 1;
        self.events_since_snapshot = 0;
    }

    /// Account for one replayed event (advances the id counter)
    pub fn note_replayed(&mut self, event_id: u64) {
        if event_id >= self.next_event_id {
            self.next_event_id = event_id + 1;
        }
        self.events_since_snapshot += 1;
    }

    /// Reset snapshot counter (called after snapshot creation)
    pub fn snapshot_created(&mut self, last_event_id: u64) {
        self.last_snapshot_event_id = last_event_id;
        self.events_since_snapshot = 0;
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
