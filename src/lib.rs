//! Sitepulse session analytics engine
//!
//! Ingests page-view, custom-event, and conversion telemetry per visitor
//! session and answers multi-dimensional aggregate queries over it.
//!
//! # Features
//!
//! - **Append-only event log**: every write is durable JSONL before the
//!   in-memory projection is touched; restart rebuilds from snapshot + replay
//! - **Thread-safe**: synchronous projection updates under one write lock,
//!   so reads always match the log
//! - **Aggregation**: date-range counts, top-N page rankings,
//!   device/geography breakdowns, conversion and funnel statistics
//! - **Real-time windows**: last-hour / last-24h counters recomputed per call
//! - **Export**: the same filtered/sorted rows as the paginated listings,
//!   unpaginated, as CSV or JSON
//!
//! # Modules
//!
//! - `types`: Core data structures (Session, TrackingEvent, aggregate rows)
//! - `event_store`: Append-only log, snapshots, store statistics
//! - `analytics`: The engine - ingestion, projection, queries, exports
//! - `api`: Axum HTTP layer (tracking + dashboard endpoints)
//! - `utils`: Timestamps, atomic file writes, user-agent classification
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sitepulse::analytics::{AnalyticsEngine, EngineConfig};
//! use sitepulse::api::{http::create_router, state::AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Arc::new(AnalyticsEngine::with_config(EngineConfig::from_env()).unwrap());
//!     let state = Arc::new(AppState::new(engine));
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3100").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod event_store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use analytics::export::{
    ConversionRow, ExportFormat, ExportKind, SessionFilter, SessionSort, SessionStatus, SortOrder,
};
pub use analytics::{AnalyticsEngine, Deadline, EngineConfig};
pub use event_store::{EventStore, EventStoreConfig, SnapshotManager};
pub use types::{
    AnalyticsError, AnalyticsResult, Conversion, ConversionData, CustomEventData, DateRange,
    DeviceInfo, FunnelStats, GeoInfo, PageView, PageViewData, Session, SessionSummary,
    TrackedEvent, TrackingEvent, TrackingEventType,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
