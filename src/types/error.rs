//! Error taxonomy for the analytics engine

use crate::event_store::EventStoreError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors surfaced by ingestion and query operations
#[derive(Debug)]
pub enum AnalyticsError {
    /// Event/conversion referenced a session id that does not exist and
    /// creation-on-demand is disabled
    UnknownSession(String),
    /// Missing, unparseable, or inverted `startDate`/`endDate`
    InvalidDateRange(String),
    /// Export `type` parameter not in the supported set
    InvalidExportType(String),
    /// An aggregation exceeded the caller's time budget
    QueryTimeout,
    /// Backing store I/O failure
    Store(EventStoreError),
}

impl std::fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyticsError::UnknownSession(id) => write!(f, "Unknown session: {}", id),
            AnalyticsError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            AnalyticsError::InvalidExportType(t) => write!(f, "Invalid export type: {}", t),
            AnalyticsError::QueryTimeout => write!(f, "Query exceeded its time budget"),
            AnalyticsError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for AnalyticsError {}

impl From<EventStoreError> for AnalyticsError {
    fn from(e: EventStoreError) -> Self {
        AnalyticsError::Store(e)
    }
}
