//! Listings and exports
//!
//! The paginated sessions endpoint and the sessions export share one
//! row-selection function, [`session_rows`]: export is "select all pages and
//! concatenate", never an independently computed query. The same applies to
//! page aggregates and conversion rows.

use serde::Serialize;

use crate::types::{
    AnalyticsError, AnalyticsResult, DateRange, PageStats, SessionSummary,
};
use crate::utils::format_timestamp;

use super::AnalyticsEngine;

/// Supported export subjects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Sessions,
    Pages,
    Conversions,
}

impl ExportKind {
    /// Parse the `type` parameter; unknown values fail with
    /// `InvalidExportType` and never silently default
    pub fn parse(value: &str) -> AnalyticsResult<Self> {
        match value {
            "sessions" => Ok(ExportKind::Sessions),
            "pages" => Ok(ExportKind::Pages),
            "conversions" => Ok(ExportKind::Conversions),
            other => Err(AnalyticsError::InvalidExportType(other.to_string())),
        }
    }

    /// File name stem for the attachment header
    pub fn file_stem(&self) -> &'static str {
        match self {
            ExportKind::Sessions => "sessions",
            ExportKind::Pages => "pages",
            ExportKind::Conversions => "conversions",
        }
    }
}

/// Supported export formats; JSON unless CSV is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(value: Option<&str>) -> AnalyticsResult<Self> {
        match value {
            None | Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(other) => Err(AnalyticsError::InvalidExportType(format!(
                "unsupported format: {}",
                other
            ))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Session activity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    All,
    Active,
    Inactive,
}

impl SessionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(SessionStatus::All),
            "active" => Some(SessionStatus::Active),
            "inactive" => Some(SessionStatus::Inactive),
            _ => None,
        }
    }
}

/// Sort key for session listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionSort {
    #[default]
    StartedAt,
    LastActivity,
    PageViews,
}

impl SessionSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "started_at" => Some(SessionSort::StartedAt),
            "last_activity" => Some(SessionSort::LastActivity),
            "page_views" => Some(SessionSort::PageViews),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Filter and sort contract shared by the paginated listing and the export
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Restrict to sessions started inside the range; `None` means all time
    pub range: Option<DateRange>,
    pub status: SessionStatus,
    pub country: Option<String>,
    pub sort: SessionSort,
    pub order: SortOrder,
}

/// One row per conversion for the conversions export
#[derive(Debug, Clone, Serialize)]
pub struct ConversionRow {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "conversionType")]
    pub conversion_type: String,
    pub value: f64,
    pub currency: String,
    #[serde(rename = "ts")]
    pub timestamp: i64,
}

/// The single row-selection path for session listings: filter, summarize,
/// sort. Pagination slices this; export takes it whole.
pub(crate) fn session_rows(
    engine: &AnalyticsEngine,
    filter: &SessionFilter,
    now: i64,
) -> Vec<SessionSummary> {
    let threshold = engine.config.activity_threshold_secs;
    let sessions = engine.sessions.read().unwrap();

    let mut rows: Vec<SessionSummary> = sessions
        .values()
        .filter(|s| filter.range.map_or(true, |r| r.contains(s.started_at)))
        .filter(|s| match filter.status {
            SessionStatus::All => true,
            SessionStatus::Active => s.is_active(now, threshold),
            SessionStatus::Inactive => !s.is_active(now, threshold),
        })
        .filter(|s| {
            filter
                .country
                .as_deref()
                .map_or(true, |c| s.location.country.eq_ignore_ascii_case(c))
        })
        .map(|s| SessionSummary::from_session(s, now, threshold))
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match filter.sort {
            SessionSort::StartedAt => a.started_at.cmp(&b.started_at),
            SessionSort::LastActivity => a.last_activity.cmp(&b.last_activity),
            SessionSort::PageViews => a.page_views.cmp(&b.page_views),
        }
        // Opaque id as tie-breaker keeps the order total
        .then_with(|| a.session_id.cmp(&b.session_id));

        match filter.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    rows
}

/// One row per conversion whose timestamp falls inside the range
pub(crate) fn conversion_rows(engine: &AnalyticsEngine, range: &DateRange) -> Vec<ConversionRow> {
    let sessions = engine.sessions.read().unwrap();

    let mut rows: Vec<ConversionRow> = sessions
        .values()
        .filter_map(|s| {
            let conversion = s.conversion.as_ref()?;
            if !range.contains(conversion.timestamp) {
                return None;
            }
            Some(ConversionRow {
                session_id: s.session_id.clone(),
                conversion_type: conversion.conversion_type.clone(),
                value: conversion.value,
                currency: conversion.currency.clone(),
                timestamp: conversion.timestamp,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    rows
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render session rows as CSV
pub fn sessions_to_csv(rows: &[SessionSummary]) -> String {
    let mut out = String::from(
        "session_id,started_at,last_activity,duration,active,page_views,events,\
         has_conversion,conversion_value,device,browser,os,country,city\n",
    );
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_field(&row.session_id),
            format_timestamp(row.started_at),
            format_timestamp(row.last_activity),
            row.duration,
            row.active,
            row.page_views,
            row.events,
            row.has_conversion,
            row.conversion_value.map_or(String::new(), |v| v.to_string()),
            csv_field(&row.device),
            csv_field(&row.browser),
            csv_field(&row.os),
            csv_field(&row.country),
            csv_field(&row.city),
        ));
    }
    out
}

/// Render page aggregate rows as CSV
pub fn pages_to_csv(rows: &[PageStats]) -> String {
    let mut out = String::from("url,title,total_views,unique_sessions,avg_time_spent\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&row.url),
            csv_field(&row.title),
            row.total_views,
            row.unique_sessions,
            row.avg_time_spent,
        ));
    }
    out
}

/// Render conversion rows as CSV
pub fn conversions_to_csv(rows: &[ConversionRow]) -> String {
    let mut out = String::from("session_id,conversion_type,value,currency,timestamp\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&row.session_id),
            csv_field(&row.conversion_type),
            row.value,
            csv_field(&row.currency),
            format_timestamp(row.timestamp),
        ));
    }
    out
}
