//! Session projection
//!
//! One pure function applies a tracking event to the session map. Live
//! ingestion and startup replay both go through it, so the projection is the
//! same whichever path built it.

use std::collections::HashMap;

use crate::event_store::EventStoreResult;
use crate::types::{
    Conversion, ConversionData, CustomEventData, PageView, PageViewData, Session, TrackedEvent,
    TrackingEvent, TrackingEventType,
};
use crate::utils::classify_user_agent;

/// Apply a single event to the session map
///
/// Sessions are created on first sight. Replay trusts the log: if an event
/// was appended, it was accepted at ingestion time, so no creation-on-demand
/// check is repeated here.
///
/// `time_spent_cap` bounds the derived per-page dwell time (seconds).
pub(crate) fn apply_event(
    sessions: &mut HashMap<String, Session>,
    event: &TrackingEvent,
    time_spent_cap: i64,
) -> EventStoreResult<()> {
    match event.event_type {
        TrackingEventType::PageViewRecorded => {
            let data: PageViewData = event.parse_data()?;
            let session = entry(sessions, event);

            close_open_page_view(session, event.timestamp, time_spent_cap);

            // The first page view fixes the device and location descriptors
            if session.page_views.is_empty() {
                session.device = classify_user_agent(&data.user_agent);
                if let Some(country) = data.country {
                    if !country.is_empty() {
                        session.location.country = country;
                    }
                }
                if let Some(city) = data.city {
                    session.location.city = city;
                }
            }

            session.page_views.push(PageView {
                url: data.url,
                title: data.title,
                timestamp: event.timestamp,
                time_spent: 0,
            });
            session.last_activity = event.timestamp;
        }

        TrackingEventType::EventRecorded => {
            let data: CustomEventData = event.parse_data()?;
            let session = entry(sessions, event);

            close_open_page_view(session, event.timestamp, time_spent_cap);

            session.events.push(TrackedEvent {
                name: data.name,
                category: data.category,
                payload: data.payload,
                timestamp: event.timestamp,
            });
            session.last_activity = event.timestamp;
        }

        TrackingEventType::ConversionRecorded => {
            let data: ConversionData = event.parse_data()?;
            let session = entry(sessions, event);

            close_open_page_view(session, event.timestamp, time_spent_cap);

            // A later conversion replaces the earlier one
            session.conversion = Some(Conversion {
                conversion_type: data.conversion_type,
                value: data.value,
                currency: data.currency,
                timestamp: event.timestamp,
            });
            session.last_activity = event.timestamp;
        }
    }

    Ok(())
}

fn entry<'a>(
    sessions: &'a mut HashMap<String, Session>,
    event: &TrackingEvent,
) -> &'a mut Session {
    sessions
        .entry(event.session_id.clone())
        .or_insert_with(|| Session::new(event.session_id.clone(), event.timestamp))
}

/// Set the dwell time of the latest page view once the next activity for the
/// session arrives. A view with `time_spent == 0` is still "open".
fn close_open_page_view(session: &mut Session, now: i64, cap: i64) {
    if let Some(view) = session.page_views.last_mut() {
        if view.time_spent == 0 {
            view.time_spent = (now - view.timestamp).clamp(0, cap);
        }
    }
}
