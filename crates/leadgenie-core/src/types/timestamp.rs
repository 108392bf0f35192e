//! Lenient timestamp decoding.
//!
//! The backend serializes some datetimes with an offset and some without
//! one. Values without an offset are UTC.

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde::{Deserialize, Deserializer};

/// Parses an RFC 3339 timestamp, or a civil datetime interpreted as UTC.
pub(crate) fn parse_lenient(value: &str) -> Option<Timestamp> {
    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Some(timestamp);
    }

    let civil = value.parse::<DateTime>().ok()?;
    civil
        .to_zoned(TimeZone::UTC)
        .ok()
        .map(|zoned| zoned.timestamp())
}

/// Deserializes an optional timestamp, mapping unparseable values to `None`.
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_lenient))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offset_timestamps() {
        let ts = parse_lenient("2025-08-16T10:00:00+00:00").unwrap();
        assert_eq!(ts.as_second(), 1_755_338_400);
    }

    #[test]
    fn parses_naive_datetimes_as_utc() {
        let ts = parse_lenient("2025-08-16T10:00:00.123456").unwrap();
        assert_eq!(ts.as_second(), 1_755_338_400);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_lenient("yesterday").is_none());
    }
}
