//! Utility functions

pub mod atomic;
pub mod time;
pub mod ua;

pub use atomic::{atomic_write_with, cleanup_temp_files};
pub use time::{current_timestamp, format_timestamp};
pub use ua::classify_user_agent;
