//! Time-related utilities.

use chrono::{DateTime, FixedOffset, Utc};

/// JST is UTC+9
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to JST RFC 3339 format
///
/// Returns `None` when the timestamp is outside the range chrono can represent.
pub fn millis_to_jst_rfc3339(timestamp_millis: i64) -> Option<String> {
    let jst_offset = FixedOffset::east_opt(JST_OFFSET_SECS)?;
    let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_millis)?;
    Some(utc.with_timezone(&jst_offset).to_rfc3339())
}
