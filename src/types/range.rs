//! Inclusive date ranges for aggregate queries
//!
//! Dashboard endpoints take `startDate`/`endDate` as ISO date strings; a
//! range covers whole days, `[start 00:00:00, end 23:59:59]` UTC inclusive.
//! Internally everything is Unix epoch seconds, matching the event log.

use chrono::NaiveDate;

use super::error::{AnalyticsError, AnalyticsResult};

/// An inclusive `[start, end]` range over epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    /// Build a range from raw timestamps; fails when inverted
    pub fn new(start: i64, end: i64) -> AnalyticsResult<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidDateRange(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse required `startDate`/`endDate` ISO date strings
    pub fn parse(start_date: Option<&str>, end_date: Option<&str>) -> AnalyticsResult<Self> {
        let start = parse_iso_date(start_date, "startDate")?;
        let end = parse_iso_date(end_date, "endDate")?;
        // End is inclusive: extend to the last second of the day
        Self::new(start, end + 86_399)
    }

    /// Parse an optional range: both dates absent means "all time"
    pub fn parse_optional(
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> AnalyticsResult<Option<Self>> {
        match (start_date, end_date) {
            (None, None) => Ok(None),
            _ => Self::parse(start_date, end_date).map(Some),
        }
    }

    /// Whether a timestamp falls inside the range
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

fn parse_iso_date(value: Option<&str>, param: &str) -> AnalyticsResult<i64> {
    let raw = value
        .ok_or_else(|| AnalyticsError::InvalidDateRange(format!("{} is required", param)))?;

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        AnalyticsError::InvalidDateRange(format!("invalid {}: '{}'", param, raw))
    })?;

    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp())
}
