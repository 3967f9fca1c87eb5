//! Date/time utilities for Gator.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

use crate::{GatorError, Result};

/// chrono pattern for the part of an RFC 1123 numeric-zone date after
/// the weekday, e.g. `02 Jan 2006 15:04:05 -0700`.
pub const RFC1123Z_BODY_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Format a timestamp for storage.
///
/// The output is fixed-width UTC RFC 3339 with microseconds, so text
/// comparison in SQL orders timestamps chronologically.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the SQLite `YYYY-MM-DD HH:MM:SS` format.
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Parse an RSS `pubDate` in the strict RFC 1123 numeric-zone format,
/// `Mon, 02 Jan 2006 15:04:05 -0700`.
///
/// The weekday must be one of the seven abbreviations but is not checked
/// against the date. The day needs two digits and the zone is `+hhmm` or
/// `-hhmm`; named zones such as `GMT`, RFC 3339 strings and surrounding
/// whitespace are rejected.
pub fn parse_pub_date(value: &str) -> Result<DateTime<Utc>> {
    let invalid = |reason: &str| GatorError::DateFormat {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (weekday, body) = value
        .split_once(", ")
        .ok_or_else(|| invalid("missing weekday"))?;
    if !WEEKDAYS.iter().any(|d| d.eq_ignore_ascii_case(weekday)) {
        return Err(invalid("unknown weekday"));
    }

    let bytes = body.as_bytes();
    if bytes.len() < 3 || !bytes[..2].iter().all(u8::is_ascii_digit) || bytes[2] != b' ' {
        return Err(invalid("day must have two digits"));
    }
    if !has_numeric_zone(body) {
        return Err(invalid("zone must be +hhmm or -hhmm"));
    }

    DateTime::parse_from_str(body, RFC1123Z_BODY_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid(&e.to_string()))
}

/// Whether `s` ends in ` +hhmm` or ` -hhmm`.
fn has_numeric_zone(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 6 {
        return false;
    }
    let zone = &bytes[bytes.len() - 6..];
    zone[0] == b' ' && matches!(zone[1], b'+' | b'-') && zone[2..].iter().all(u8::is_ascii_digit)
}

/// Format a DateTime<Utc> to the specified timezone.
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}
