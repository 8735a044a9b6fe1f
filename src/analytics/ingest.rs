//! Ingestion writes
//!
//! Each write appends to the event log and updates the projection while
//! holding the session write lock, so readers always see the log and the
//! projection agree. Timestamps are assigned here, at ingestion time.

use std::collections::HashMap;

use crate::event_store::{EventStore, EventStoreError, SnapshotManager};
use crate::types::{
    AnalyticsError, AnalyticsResult, ConversionData, CustomEventData, PageViewData, Session,
    TrackingEvent, TrackingEventType,
};

use super::{projector, AnalyticsEngine, EngineConfig};

/// Record a page view, creating the session on first sight
pub(crate) fn record_page_view(
    engine: &AnalyticsEngine,
    session_id: &str,
    data: PageViewData,
) -> AnalyticsResult<TrackingEvent> {
    let payload = to_payload(&data)?;
    append_and_project(engine, TrackingEventType::PageViewRecorded, session_id, payload)
}

/// Record a custom event
///
/// With creation-on-demand disabled, an unseen session id is rejected
/// before anything is written.
pub(crate) fn record_event(
    engine: &AnalyticsEngine,
    session_id: &str,
    data: CustomEventData,
) -> AnalyticsResult<TrackingEvent> {
    let payload = to_payload(&data)?;
    require_session(engine, session_id)?;
    append_and_project(engine, TrackingEventType::EventRecorded, session_id, payload)
}

/// Record a conversion; a later conversion replaces the earlier one
pub(crate) fn record_conversion(
    engine: &AnalyticsEngine,
    session_id: &str,
    data: ConversionData,
) -> AnalyticsResult<TrackingEvent> {
    let payload = to_payload(&data)?;
    require_session(engine, session_id)?;
    append_and_project(engine, TrackingEventType::ConversionRecorded, session_id, payload)
}

fn to_payload<T: serde::Serialize>(data: &T) -> AnalyticsResult<serde_json::Value> {
    serde_json::to_value(data).map_err(|e| AnalyticsError::Store(EventStoreError::Json(e)))
}

fn require_session(engine: &AnalyticsEngine, session_id: &str) -> AnalyticsResult<()> {
    if engine.config.create_on_demand {
        return Ok(());
    }
    if engine.sessions.read().unwrap().contains_key(session_id) {
        Ok(())
    } else {
        Err(AnalyticsError::UnknownSession(session_id.to_string()))
    }
}

fn append_and_project(
    engine: &AnalyticsEngine,
    event_type: TrackingEventType,
    session_id: &str,
    payload: serde_json::Value,
) -> AnalyticsResult<TrackingEvent> {
    let mut sessions = engine.sessions.write().unwrap();
    let mut store = engine.store.lock().unwrap();

    let event = store.create_and_append(event_type, session_id, payload)?;
    projector::apply_event(&mut sessions, &event, engine.config.activity_threshold_secs)?;

    maybe_snapshot(&engine.config, &mut store, &sessions);

    Ok(event)
}

/// Cut a snapshot when the log has run far enough ahead of the last one.
/// Snapshot failures are logged and do not fail the write.
fn maybe_snapshot(
    config: &EngineConfig,
    store: &mut EventStore,
    sessions: &HashMap<String, Session>,
) {
    if !store.should_snapshot() {
        return;
    }

    let mut all: Vec<&Session> = sessions.values().collect();
    all.sort_by(|a, b| a.session_id.cmp(&b.session_id));

    let last_id = store.last_event_id();
    let manager = SnapshotManager::new(config.store.clone());
    match manager.create_snapshot(last_id, &all) {
        Ok(_) => store.snapshot_created(last_id),
        Err(e) => eprintln!("Warning: snapshot failed: {}", e),
    }
}
