//! Analytics engine - core data engine
//!
//! This module contains the engine that owns the append-only event store and
//! the projected per-session state, with thread-safe ingestion writes and
//! read-only aggregate queries.
//!
//! Writes append to the log and update the projection under one write lock,
//! so a reader can never observe a session whose counters disagree with its
//! event list. All queries recompute from the projection on every call.

mod aggregate;
pub mod export;
mod ingest;
pub(crate) mod projector;
mod realtime;

use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::event_store::{
    EventStore, EventStoreConfig, EventStoreStats, SnapshotManager, StatsCollector,
};
use crate::types::{
    AnalyticsError, AnalyticsResult, ConversionData, ConversionTypeStats, CountryCount,
    CountryStats, CustomEventData, DateRange, DeviceStatsRow, FunnelStats, OverviewStats,
    PageCount, PageStats, PageViewData, RealtimeStats, Session, SessionSummary, TrackingEvent,
};

use export::{ConversionRow, SessionFilter};

/// Engine configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Event store paths and snapshot threshold
    pub store: EventStoreConfig,
    /// Recency threshold (seconds) for the "active session" predicate
    pub activity_threshold_secs: i64,
    /// Whether events/conversions for unseen session ids create the session
    pub create_on_demand: bool,
    /// Time budget for the heavy grouped queries
    pub query_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: EventStoreConfig::default(),
            activity_threshold_secs: 1800,
            create_on_demand: true,
            query_timeout: Duration::from_millis(5000),
        }
    }
}

impl EngineConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("SITEPULSE_DATA_DIR") {
            if !dir.is_empty() {
                config.store = EventStoreConfig::new(dir);
            }
        }
        if let Some(threshold) = env_parse::<usize>("SITEPULSE_SNAPSHOT_THRESHOLD") {
            config.store.snapshot_threshold = threshold;
        }
        if let Some(secs) = env_parse::<i64>("SITEPULSE_ACTIVITY_THRESHOLD_SECS") {
            config.activity_threshold_secs = secs;
        }
        if let Some(enabled) = env_parse::<bool>("SITEPULSE_CREATE_ON_DEMAND") {
            config.create_on_demand = enabled;
        }
        if let Some(ms) = env_parse::<u64>("SITEPULSE_QUERY_TIMEOUT_MS") {
            config.query_timeout = Duration::from_millis(ms);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// A caller-supplied time budget for aggregation queries
///
/// Checked while scanning; on expiry the query fails whole with
/// `QueryTimeout` rather than returning partial aggregates.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// No time budget
    pub fn none() -> Self {
        Self { expires_at: None }
    }

    /// Expires after the given budget
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
        }
    }

    /// Fail with `QueryTimeout` if the budget is spent
    pub fn check(&self) -> AnalyticsResult<()> {
        match self.expires_at {
            Some(at) if Instant::now() >= at => Err(AnalyticsError::QueryTimeout),
            _ => Ok(()),
        }
    }
}

/// Analytics engine with an in-memory session projection for thread-safe
/// ingestion and queries
pub struct AnalyticsEngine {
    pub(crate) config: EngineConfig,
    pub(crate) store: Mutex<EventStore>,
    pub(crate) sessions: RwLock<HashMap<String, Session>>,
}

impl AnalyticsEngine {
    /// Create an engine with default configuration
    pub fn new() -> AnalyticsResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine, rebuilding the session projection from the latest
    /// snapshot plus any events appended after it
    pub fn with_config(config: EngineConfig) -> AnalyticsResult<Self> {
        let mut store = EventStore::with_config(config.store.clone());
        let manager = SnapshotManager::new(config.store.clone());
        let mut sessions: HashMap<String, Session> = HashMap::new();

        let snapshot = match manager.load_full() {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Warning: failed to load snapshot: {}", e);
                manager.recover_from_backup()?
            }
        };

        let mut replayed = 0usize;
        if let Some((meta, loaded)) = snapshot {
            for session in loaded {
                sessions.insert(session.session_id.clone(), session);
            }
            store.restore_from_snapshot(meta.last_event_id);

            for event in store.load_events_after(meta.last_event_id)? {
                Self::replay_event(&mut sessions, &event, config.activity_threshold_secs);
                store.note_replayed(event.event_id);
                replayed += 1;
            }

            println!(
                "Loaded snapshot (event_id: {}) + replayed {} events. Total: {} sessions.",
                meta.last_event_id,
                replayed,
                sessions.len()
            );
        } else {
            for event in store.load_events()? {
                Self::replay_event(&mut sessions, &event, config.activity_threshold_secs);
                store.note_replayed(event.event_id);
                replayed += 1;
            }

            if replayed > 0 {
                println!(
                    "No snapshot found. Replayed {} events. Total: {} sessions.",
                    replayed,
                    sessions.len()
                );
            }
        }

        Ok(Self {
            config,
            store: Mutex::new(store),
            sessions: RwLock::new(sessions),
        })
    }

    fn replay_event(
        sessions: &mut HashMap<String, Session>,
        event: &TrackingEvent,
        time_spent_cap: i64,
    ) {
        if let Err(e) = projector::apply_event(sessions, event, time_spent_cap) {
            eprintln!("Warning: skipping event {}: {}", event.event_id, e);
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of sessions currently projected
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Fetch one session by its opaque identifier
    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().unwrap().get(session_id).cloned()
    }

    /// Collect statistics about the backing store files
    pub fn store_stats(&self) -> AnalyticsResult<EventStoreStats> {
        let collector = StatsCollector::new(self.config.store.clone());
        Ok(collector.collect()?)
    }

    /// Write a snapshot of the current projection, unconditionally
    pub fn flush_snapshot(&self) -> AnalyticsResult<()> {
        let sessions = self.sessions.read().unwrap();
        let mut store = self.store.lock().unwrap();

        let mut all: Vec<&Session> = sessions.values().collect();
        all.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        let last_id = store.last_event_id();
        let manager = SnapshotManager::new(self.config.store.clone());
        manager.create_snapshot(last_id, &all)?;
        store.snapshot_created(last_id);

        Ok(())
    }
}

// Re-export methods from submodules by implementing them here
impl AnalyticsEngine {
    // Ingestion operations (from ingest.rs)
    pub fn record_page_view(
        &self,
        session_id: &str,
        data: PageViewData,
    ) -> AnalyticsResult<TrackingEvent> {
        ingest::record_page_view(self, session_id, data)
    }

    pub fn record_event(
        &self,
        session_id: &str,
        data: CustomEventData,
    ) -> AnalyticsResult<TrackingEvent> {
        ingest::record_event(self, session_id, data)
    }

    pub fn record_conversion(
        &self,
        session_id: &str,
        data: ConversionData,
    ) -> AnalyticsResult<TrackingEvent> {
        ingest::record_conversion(self, session_id, data)
    }

    // Aggregate queries (from aggregate.rs)
    pub fn count_active_sessions(&self, now: i64) -> usize {
        aggregate::count_active_sessions(self, now)
    }

    pub fn count_sessions_in_range(&self, range: &DateRange) -> usize {
        aggregate::count_sessions_in_range(self, range)
    }

    pub fn conversion_rate(&self, range: &DateRange) -> f64 {
        aggregate::conversion_rate(self, range)
    }

    pub fn top_pages(&self, limit: usize, deadline: &Deadline) -> AnalyticsResult<Vec<PageStats>> {
        aggregate::top_pages(self, limit, deadline)
    }

    pub fn page_analytics(
        &self,
        range: &DateRange,
        limit: usize,
        deadline: &Deadline,
    ) -> AnalyticsResult<Vec<PageStats>> {
        aggregate::page_analytics(self, range, limit, deadline)
    }

    pub fn device_stats(
        &self,
        range: &DateRange,
        deadline: &Deadline,
    ) -> AnalyticsResult<Vec<DeviceStatsRow>> {
        aggregate::device_stats(self, range, deadline)
    }

    pub fn geographic_stats(
        &self,
        range: &DateRange,
        limit: usize,
        deadline: &Deadline,
    ) -> AnalyticsResult<Vec<CountryStats>> {
        aggregate::geographic_stats(self, range, limit, deadline)
    }

    pub fn funnel_stats(&self, range: &DateRange) -> FunnelStats {
        aggregate::funnel_stats(self, range)
    }

    pub fn conversion_analytics(&self, range: &DateRange) -> Vec<ConversionTypeStats> {
        aggregate::conversion_analytics(self, range)
    }

    pub fn overview(
        &self,
        range: &DateRange,
        now: i64,
        deadline: &Deadline,
    ) -> AnalyticsResult<OverviewStats> {
        aggregate::overview(self, range, now, deadline)
    }

    // Real-time windows (from realtime.rs)
    pub fn realtime(&self, now: i64) -> RealtimeStats {
        realtime::realtime(self, now)
    }

    pub fn active_sessions_last_hour(&self, now: i64) -> usize {
        realtime::active_sessions_last_hour(self, now)
    }

    pub fn sessions_last_24h(&self, now: i64) -> usize {
        realtime::sessions_last_24h(self, now)
    }

    pub fn current_page_views(&self, now: i64, limit: usize) -> Vec<PageCount> {
        realtime::current_page_views(self, now, limit)
    }

    pub fn active_geo_distribution(&self, now: i64, limit: usize) -> Vec<CountryCount> {
        realtime::active_geo_distribution(self, now, limit)
    }

    // Listing and export rows (from export.rs)
    pub fn session_rows(&self, filter: &SessionFilter, now: i64) -> Vec<SessionSummary> {
        export::session_rows(self, filter, now)
    }

    pub fn conversion_rows(&self, range: &DateRange) -> Vec<ConversionRow> {
        export::conversion_rows(self, range)
    }
}
