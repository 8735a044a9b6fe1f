//! Shared application state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::analytics::AnalyticsEngine;

/// Shared state for all HTTP handlers
pub struct AppState {
    /// The analytics engine
    pub engine: Arc<AnalyticsEngine>,

    /// Monotonically increasing ingest counter, echoed as `sequence_id` in
    /// responses so dashboard clients can tell when data moved underneath them
    pub sequence_counter: AtomicU64,
}

impl AppState {
    /// Create a new AppState around the given engine
    pub fn new(engine: Arc<AnalyticsEngine>) -> Self {
        Self {
            engine,
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// Bump the sequence counter after a successful ingest
    pub fn record_ingest(&self) -> u64 {
        self.sequence_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the current sequence ID
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }
}
