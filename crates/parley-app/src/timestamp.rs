//! Message timestamps.
//!
//! Outbound timestamps are RFC 3339 in UTC with millisecond precision. Inbound
//! timestamps come from the server as RFC 3339 or `%Y-%m-%d %H:%M:%S` and are
//! shown as 24-hour `HH:MM:SS` in the offset they were written in.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Server-side timestamp format.
pub const SERVER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format.
pub const DISPLAY_FORMAT: &str = "%H:%M:%S";

/// Shown in place of a missing or malformed timestamp.
pub const PLACEHOLDER: &str = "--:--:--";

/// Stamp an outbound message.
pub fn outgoing(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an inbound timestamp. `None` if empty or in neither known format.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, SERVER_FORMAT))
        .ok()
}

/// Format for display, falling back to [`PLACEHOLDER`].
pub fn display(timestamp: Option<NaiveDateTime>) -> String {
    timestamp.map_or_else(|| PLACEHOLDER.to_string(), |ts| ts.format(DISPLAY_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn outgoing_is_rfc3339_utc_millis() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(outgoing(now), "2024-03-09T14:05:07.000Z");
    }

    #[test]
    fn parses_both_server_formats() {
        assert_eq!(display(parse("2024-03-09 14:05:07")), "14:05:07");
        assert_eq!(display(parse("2024-03-09T14:05:07.250Z")), "14:05:07");
        assert_eq!(display(parse("2024-03-09T14:05:07+02:00")), "14:05:07");
    }

    #[test]
    fn outgoing_parses_back() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(display(parse(&outgoing(now))), "23:59:59");
    }

    #[test]
    fn malformed_shows_placeholder() {
        for raw in ["", "   ", "yesterday", "2024-13-40 99:99:99", "14:05"] {
            assert_eq!(parse(raw), None, "{raw:?}");
        }
        assert_eq!(display(None), PLACEHOLDER);
    }
}
