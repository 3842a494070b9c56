//! Date parsing and display for server-provided timestamps.
//!
//! All-day events are calendar dates and timed events are instants. They go
//! through separate paths: routing an all-day date through a UTC instant and
//! back to local time shifts it by a day for viewers west of UTC.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {input:?} as a date: {reason}")]
pub struct ParseError {
    pub input: String,
    pub reason: &'static str,
}

impl ParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Fallback formats tried after RFC 3339, once any `Z` suffix has been
/// rewritten to `+00:00`.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
];

/// True when the string carries its own zone: a `Z`, a `+`, or a `-` past
/// the date portion (byte 10 onward).
fn has_zone_marker(raw: &str) -> bool {
    raw.contains('Z') || raw.contains('+') || raw.bytes().skip(10).any(|b| b == b'-')
}

/// Parse a server timestamp into an instant.
///
/// Strings without a zone marker are read as UTC.
pub fn parse_date_time(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(raw, "empty string"));
    }

    let normalized = if has_zone_marker(trimmed) {
        trimmed.to_string()
    } else {
        format!("{trimmed}Z")
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    let with_offset = match normalized.strip_suffix('Z') {
        Some(body) => format!("{body}+00:00"),
        None => normalized,
    };

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    // Bare date with an offset, e.g. "2025-08-22+00:00": midnight at that offset.
    if let (Some(date_part), Some(offset_part)) = (with_offset.get(..10), with_offset.get(10..)) {
        if let (Ok(date), Some(offset)) = (
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d"),
            parse_offset(offset_part),
        ) {
            let midnight = date.and_time(chrono::NaiveTime::MIN);
            if let Some(dt) = offset.from_local_datetime(&midnight).single() {
                return Ok(dt.with_timezone(&Utc));
            }
        }
    }

    Err(ParseError::new(raw, "not a recognised date-time format"))
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = match raw.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = raw[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Calendar day an event string falls on, in the viewer's local zone.
pub fn parse_calendar_date(raw: &str, all_day: bool) -> Result<NaiveDate, ParseError> {
    parse_calendar_date_in(raw, all_day, &Local)
}

/// Calendar day an event string falls on, as seen from `tz`.
///
/// With `all_day` set only the leading `YYYY-MM-DD` is read and the date is
/// built from its numeric parts, so `tz` cannot move it. Otherwise the
/// string is parsed as an instant and converted to `tz`.
pub fn parse_calendar_date_in<Tz: TimeZone>(
    raw: &str,
    all_day: bool,
    tz: &Tz,
) -> Result<NaiveDate, ParseError> {
    if all_day {
        return parse_date_prefix(raw);
    }
    Ok(parse_date_time(raw)?.with_timezone(tz).date_naive())
}

fn parse_date_prefix(raw: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = raw.trim();
    let prefix = trimmed
        .get(..10)
        .ok_or_else(|| ParseError::new(raw, "shorter than YYYY-MM-DD"))?;

    let mut parts = prefix.split('-');
    let (Some(y), Some(m), Some(d), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::new(raw, "expected YYYY-MM-DD"));
    };
    if y.len() != 4 || m.len() != 2 || d.len() != 2 {
        return Err(ParseError::new(raw, "expected YYYY-MM-DD"));
    }

    let year: i32 = y.parse().map_err(|_| ParseError::new(raw, "invalid year"))?;
    let month: u32 = m.parse().map_err(|_| ParseError::new(raw, "invalid month"))?;
    let day: u32 = d.parse().map_err(|_| ParseError::new(raw, "invalid day"))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ParseError::new(raw, "date out of range"))
}

/// Format a naive local date-time as the UTC instant string the backend
/// stores, e.g. `2025-08-22T13:00:00.000Z`.
pub fn to_server_instant_in<Tz: TimeZone>(local: NaiveDateTime, tz: &Tz) -> Option<String> {
    let dt = tz.from_local_datetime(&local).earliest()?;
    Some(
        dt.with_timezone(&Utc)
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    )
}

pub fn format_date_time(raw: &str) -> String {
    format_date_time_in(raw, &Local)
}

/// "Friday, Aug 22, 2025 at 1:30 PM", or `raw` when it does not parse.
pub fn format_date_time_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_or_raw(raw, tz, "%A, %b %-d, %Y at %-I:%M %p")
}

pub fn format_date(raw: &str) -> String {
    format_date_in(raw, &Local)
}

pub fn format_date_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_or_raw(raw, tz, "%b %-d, %Y")
}

pub fn format_time(raw: &str) -> String {
    format_time_in(raw, &Local)
}

pub fn format_time_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_or_raw(raw, tz, "%-I:%M %p")
}

fn format_or_raw<Tz: TimeZone>(raw: &str, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_date_time(raw) {
        Ok(dt) => dt.with_timezone(tz).format(fmt).to_string(),
        Err(err) => {
            tracing::debug!(%err, "showing unparsed timestamp");
            raw.to_string()
        }
    }
}

/// An instant split into display parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedDisplay {
    pub date: String,
    pub time: String,
    pub zone: String,
}

pub fn format_with_zone(raw: &str) -> ZonedDisplay {
    format_with_zone_in(raw, &Local)
}

/// On parse failure `date` holds the raw string and the other parts are empty.
pub fn format_with_zone_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> ZonedDisplay
where
    Tz::Offset: std::fmt::Display,
{
    match parse_date_time(raw) {
        Ok(dt) => {
            let local = dt.with_timezone(tz);
            ZonedDisplay {
                date: local.format("%A, %b %-d").to_string(),
                time: local.format("%-I:%M %p").to_string(),
                zone: local.offset().to_string(),
            }
        }
        Err(_) => ZonedDisplay {
            date: raw.to_string(),
            time: String::new(),
            zone: String::new(),
        },
    }
}

/// Date-only display for all-day events; never converts through UTC.
pub fn format_all_day(raw: &str) -> String {
    match parse_date_prefix(raw) {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use chrono_tz::{America::Los_Angeles, Asia::Tokyo, Pacific::Kiritimati};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn naive_timestamp_is_read_as_utc() {
        let dt = parse_date_time("2025-08-22T23:30:00").unwrap();
        assert_eq!(dt.hour(), 23);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.day(), 22);
    }

    #[test]
    fn explicit_offsets_are_honoured() {
        let z = parse_date_time("2025-08-22T23:30:00Z").unwrap();
        let plus = parse_date_time("2025-08-23T01:30:00+02:00").unwrap();
        let minus = parse_date_time("2025-08-22T19:30:00-04:00").unwrap();
        assert_eq!(z, plus);
        assert_eq!(z, minus);
    }

    #[test]
    fn accepts_fractional_seconds_and_missing_seconds() {
        let millis = parse_date_time("2025-08-22T13:00:00.000Z").unwrap();
        let short = parse_date_time("2025-08-22T13:00").unwrap();
        let spaced = parse_date_time("2025-08-22 13:00:00").unwrap();
        assert_eq!(millis, short);
        assert_eq!(millis, spaced);
    }

    #[test]
    fn compact_offset_without_colon() {
        let dt = parse_date_time("2025-08-22T13:00:00+0530").unwrap();
        assert_eq!(dt.hour(), 7);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn date_only_string_is_utc_midnight() {
        let dt = parse_date_time("2025-08-22").unwrap();
        assert_eq!((dt.day(), dt.hour()), (22, 0));
    }

    #[test]
    fn hyphen_inside_date_portion_is_not_an_offset() {
        // Dashes before byte 10 belong to the date, so "Z" is still appended.
        assert!(!has_zone_marker("2025-08-22T10:00:00"));
        assert!(has_zone_marker("2025-08-22T10:00:00-07:00"));
        assert!(has_zone_marker("2025-08-22T10:00:00+07:00"));
        assert!(has_zone_marker("2025-08-22T10:00:00Z"));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_date_time("next tuesday").unwrap_err();
        assert_eq!(err.input, "next tuesday");
        assert!(parse_date_time("").is_err());
        assert!(parse_date_time("2025-13-40T10:00:00").is_err());
    }

    #[test]
    fn timed_event_lands_on_local_day_behind_utc() {
        // 23:30 UTC on the 22nd is 16:30 on the 22nd in Los Angeles...
        let la = parse_calendar_date_in("2025-08-22T23:30:00", false, &Los_Angeles).unwrap();
        assert_eq!(la, ymd(2025, 8, 22));
        // ...and already the 23rd in Tokyo.
        let tokyo = parse_calendar_date_in("2025-08-22T23:30:00", false, &Tokyo).unwrap();
        assert_eq!(tokyo, ymd(2025, 8, 23));
        // 02:00 UTC on the 23rd is still the 22nd in Los Angeles.
        let early = parse_calendar_date_in("2025-08-23T02:00:00", false, &Los_Angeles).unwrap();
        assert_eq!(early, ymd(2025, 8, 22));
    }

    #[test]
    fn all_day_date_never_shifts() {
        for raw in ["2025-08-22", "2025-08-22T00:00:00", "2025-08-22T00:00:00Z"] {
            assert_eq!(parse_calendar_date_in(raw, true, &Los_Angeles).unwrap(), ymd(2025, 8, 22));
            assert_eq!(parse_calendar_date_in(raw, true, &Tokyo).unwrap(), ymd(2025, 8, 22));
            assert_eq!(parse_calendar_date_in(raw, true, &Kiritimati).unwrap(), ymd(2025, 8, 22));
            assert_eq!(parse_calendar_date_in(raw, true, &Utc).unwrap(), ymd(2025, 8, 22));
        }
    }

    #[test]
    fn all_day_rejects_malformed_prefix() {
        assert!(parse_calendar_date_in("2025-8-22", true, &Utc).is_err());
        assert!(parse_calendar_date_in("2025-02-30", true, &Utc).is_err());
        assert!(parse_calendar_date_in("20250822", true, &Utc).is_err());
    }

    #[test]
    fn server_instant_from_local_wall_clock() {
        let local = ymd(2025, 8, 22).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(
            to_server_instant_in(local, &Los_Angeles).as_deref(),
            Some("2025-08-22T16:00:00.000Z")
        );
        assert_eq!(
            to_server_instant_in(local, &Utc).as_deref(),
            Some("2025-08-22T09:00:00.000Z")
        );
    }

    #[test]
    fn display_helpers_format_in_zone() {
        let raw = "2025-08-22T20:30:00";
        assert_eq!(format_date_time_in(raw, &Los_Angeles), "Friday, Aug 22, 2025 at 1:30 PM");
        assert_eq!(format_date_in(raw, &Tokyo), "Aug 23, 2025");
        assert_eq!(format_time_in(raw, &Utc), "8:30 PM");
    }

    #[test]
    fn display_helpers_fall_back_to_raw() {
        assert_eq!(format_date_time_in("soon", &Utc), "soon");
        assert_eq!(format_time_in("soon", &Utc), "soon");
        let zoned = format_with_zone_in("soon", &Utc);
        assert_eq!(zoned.date, "soon");
        assert!(zoned.time.is_empty() && zoned.zone.is_empty());
        assert_eq!(format_all_day("someday"), "someday");
    }

    #[test]
    fn zoned_display_reports_offset() {
        let zoned = format_with_zone_in("2025-08-22T20:30:00Z", &Los_Angeles);
        assert_eq!(zoned.date, "Friday, Aug 22");
        assert_eq!(zoned.time, "1:30 PM");
        assert_eq!(zoned.zone, "PDT");
    }

    #[test]
    fn all_day_display_uses_calendar_date() {
        assert_eq!(format_all_day("2025-08-22"), "Aug 22, 2025");
    }
}
