pub mod items;
pub mod resume;
pub mod version;

use chrono::{DateTime, Utc};

/// Current time truncated to millisecond precision, matching the persisted
/// timestamp format so values survive a serialize/deserialize cycle unchanged.
pub fn now_millis() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now)
}
