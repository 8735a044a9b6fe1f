//! API module for the HTTP endpoints
//!
//! This module provides the ingestion endpoints used by the tracking script
//! and the REST API consumed by the dashboard UI.

pub mod http;
pub mod rest;
pub mod state;
