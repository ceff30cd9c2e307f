use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Milliseconds since the Unix epoch, as stored in persisted cache entries.
pub type EpochMillis = i64;

/// Parse the timestamp formats the remote APIs emit: RFC 3339, a naive
/// date-time (fractional seconds optional), or a bare date. Naive values
/// are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}
