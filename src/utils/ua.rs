//! User-agent classification
//!
//! Best-effort substring sniffing of the raw user-agent header into a
//! (device class, browser, os) triple. Unrecognized strings classify as
//! "unknown" rather than failing; the descriptors only feed breakdown
//! groupings, never control flow.

use crate::types::DeviceInfo;

/// Classify a raw user-agent string into a device descriptor
pub fn classify_user_agent(user_agent: &str) -> DeviceInfo {
    let ua = user_agent.to_ascii_lowercase();

    let device = if ua.contains("ipad") || ua.contains("tablet") {
        "tablet"
    } else if ua.contains("mobi") || ua.contains("iphone") || ua.contains("android") {
        "mobile"
    } else if ua.is_empty() {
        "unknown"
    } else {
        "desktop"
    };

    // Order matters: Edge and Opera UAs also contain "chrome",
    // Chrome and Edge UAs also contain "safari"
    let browser = if ua.contains("edg/") || ua.contains("edge") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("chrome") || ua.contains("crios") {
        "Chrome"
    } else if ua.contains("safari") {
        "Safari"
    } else {
        "unknown"
    };

    // Android before Linux, iOS before Mac
    let os = if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        "iOS"
    } else if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "unknown"
    };

    DeviceInfo {
        device: device.to_string(),
        browser: browser.to_string(),
        os: os.to_string(),
    }
}
