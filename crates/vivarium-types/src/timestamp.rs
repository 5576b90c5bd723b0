//! Reading timestamp parsing and display.
//!
//! The backend stores readings with naive local timestamps such as
//! `2024-05-01 13:37:05.123456`, written in whatever offset its host runs
//! in. Those are accepted here together with RFC 3339 timestamps. A naive
//! timestamp is placed in the offset the caller passes, normally the
//! backend's offset.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{ParseError, ParseResult};

/// Parse a reading timestamp.
///
/// RFC 3339 timestamps keep their own offset. Naive timestamps are read as
/// wall-clock time in `naive_offset`.
///
/// # Examples
///
/// ```
/// use time::macros::{datetime, offset};
/// use vivarium_types::timestamp::parse_timestamp;
///
/// let ts = parse_timestamp("2024-05-01 13:37:05.250000", offset!(+1)).unwrap();
/// assert_eq!(ts, datetime!(2024-05-01 13:37:05.25 +1));
///
/// assert!(parse_timestamp("2024-05-01T13:37:05Z", offset!(+1)).is_ok());
/// assert!(parse_timestamp("yesterday", offset!(UTC)).is_err());
/// ```
pub fn parse_timestamp(value: &str, naive_offset: UtcOffset) -> ParseResult<OffsetDateTime> {
    let value = value.trim();
    if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(ts);
    }

    let invalid = || ParseError::InvalidTimestamp(value.to_string());

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    let whole = whole.replacen('T', " ", 1);

    let naive = PrimitiveDateTime::parse(
        &whole,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map_err(|_| invalid())?;

    let nanos = match fraction {
        Some(digits) => parse_fraction(digits).ok_or_else(invalid)?,
        None => 0,
    };

    let naive = naive.replace_nanosecond(nanos).map_err(|_| invalid())?;
    Ok(naive.assume_offset(naive_offset))
}

/// Parse a UTC offset given as `UTC`, `Z` or `+HH:MM`.
///
/// ```
/// use time::macros::offset;
/// use vivarium_types::timestamp::parse_utc_offset;
///
/// assert_eq!(parse_utc_offset("+05:30").unwrap(), offset!(+5:30));
/// assert_eq!(parse_utc_offset("utc").unwrap(), offset!(UTC));
/// ```
pub fn parse_utc_offset(value: &str) -> ParseResult<UtcOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(
        value,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| ParseError::InvalidOffset(value.to_string()))
}

/// The host's current UTC offset, or UTC if it cannot be determined.
///
/// On Unix the offset can only be read while the process is single-threaded,
/// so call this before starting an async runtime.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Parse up to nine fractional-second digits into nanoseconds.
fn parse_fraction(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digits past nanosecond precision are dropped.
    let mut padded: String = digits.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded.parse().ok()
}

/// Drop the sub-second part of a timestamp.
#[must_use]
pub fn truncate_to_second(ts: OffsetDateTime) -> OffsetDateTime {
    ts.replace_nanosecond(0).unwrap_or(ts)
}

/// Round a timestamp up to the next whole second (unchanged if already whole).
#[must_use]
pub fn ceil_to_second(ts: OffsetDateTime) -> OffsetDateTime {
    let truncated = truncate_to_second(ts);
    if truncated == ts {
        ts
    } else {
        truncated + Duration::SECOND
    }
}

/// Format a timestamp the way the table and chart labels show it:
/// `YYYY-MM-DD HH:MM:SS`, fraction dropped.
#[must_use]
pub fn format_label(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// Serde adapter for [`crate::SensorReading`] timestamps, as RFC 3339.
///
/// Naive backend timestamps need an offset and are not accepted here; they
/// are decoded by the sync engine, which knows the backend's offset.
#[cfg(feature = "serde")]
pub mod serde_reading_datetime {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S: Serializer>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let text = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn test_parse_naive_without_fraction() {
        let ts = parse_timestamp("2024-05-01 13:37:05", offset!(UTC)).unwrap();
        assert_eq!(ts, datetime!(2024-05-01 13:37:05 UTC));
    }

    #[test]
    fn test_parse_naive_uses_given_offset() {
        let ts = parse_timestamp("2024-05-01 13:00:00", offset!(+1)).unwrap();
        assert_eq!(ts, datetime!(2024-05-01 12:00:00 UTC));
        assert_eq!(ts.unix_timestamp(), 1_714_564_800);
        assert_eq!(format_label(ts), "2024-05-01 13:00:00");
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("Z").unwrap(), offset!(UTC));
        assert_eq!(parse_utc_offset("-03:00").unwrap(), offset!(-3));
        assert!(matches!(
            parse_utc_offset("01:00"),
            Err(ParseError::InvalidOffset(_))
        ));
        assert!(parse_utc_offset("Europe/London").is_err());
    }

    #[test]
    fn test_parse_naive_with_microseconds() {
        let ts = parse_timestamp("2024-05-01 13:37:05.000123", offset!(UTC)).unwrap();
        assert_eq!(ts.microsecond(), 123);
    }

    #[test]
    fn test_parse_naive_with_t_separator() {
        let ts = parse_timestamp("2024-05-01T13:37:05.5", offset!(UTC)).unwrap();
        assert_eq!(ts.millisecond(), 500);
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        let ts = parse_timestamp("2024-05-01T14:37:05+01:00", offset!(-5)).unwrap();
        assert_eq!(ts, datetime!(2024-05-01 13:37:05 UTC));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("2024-05-01 25:00:00", offset!(UTC)),
            Err(ParseError::InvalidTimestamp(_))
        ));
        assert!(parse_timestamp("2024-05-01 13:37:05.", offset!(UTC)).is_err());
        assert!(parse_timestamp("2024-05-01 13:37:05.12ab", offset!(UTC)).is_err());
        assert!(parse_timestamp("", offset!(UTC)).is_err());
    }

    #[test]
    fn test_overlong_fraction_is_truncated() {
        let ts = parse_timestamp("2024-05-01 13:37:05.1234567891", offset!(UTC)).unwrap();
        assert_eq!(ts.nanosecond(), 123_456_789);
    }

    #[test]
    fn test_ceil_and_truncate() {
        let ts = datetime!(2024-05-01 13:37:05.4 UTC);
        assert_eq!(truncate_to_second(ts), datetime!(2024-05-01 13:37:05 UTC));
        assert_eq!(ceil_to_second(ts), datetime!(2024-05-01 13:37:06 UTC));

        let whole = datetime!(2024-05-01 13:37:05 UTC);
        assert_eq!(ceil_to_second(whole), whole);
    }

    #[test]
    fn test_format_label_drops_fraction() {
        let ts = datetime!(2024-01-09 07:03:02.987 UTC);
        assert_eq!(format_label(ts), "2024-01-09 07:03:02");
    }
}
