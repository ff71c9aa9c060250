use chrono::{DateTime, SecondsFormat, Utc};

/// Current wall-clock time, used to stamp game results.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 rendering with millisecond precision and a `Z` suffix.
pub fn to_iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
