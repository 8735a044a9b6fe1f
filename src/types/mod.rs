//! Data types for the Sitepulse analytics engine
//!
//! This module contains all the core data structures used throughout the application.

mod error;
mod event;
mod range;
mod session;
mod stats;

pub use error::{AnalyticsError, AnalyticsResult};
pub use event::{
    ConversionData, CustomEventData, PageViewData, SnapshotMeta, TrackingEvent, TrackingEventType,
};
pub use range::DateRange;
pub use session::{
    Conversion, DeviceInfo, GeoInfo, PageView, Session, SessionSummary, TrackedEvent,
};
pub use stats::{
    ConversionTypeStats, CountryCount, CountryStats, DeviceStatsRow, FunnelStats, OverviewStats,
    PageCount, PageStats, RealtimeStats,
};

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &i64) -> bool {
    *val == 0
}
