use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{LedgerError, Result};

/// Storage format: local wall-clock time, millisecond precision.
const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp.
///
/// Accepts a bare date (midnight), a naive date-time with optional fraction,
/// or RFC 3339 with an offset, which is converted to local time.
/// Anything finer than a millisecond is dropped, as storage would.
pub(crate) fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(to_storage_precision(dt));
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| to_storage_precision(dt.with_timezone(&Local).naive_local()))
        .map_err(|_| LedgerError::InvalidTimestamp(s.to_string()))
}

/// Like [`parse_timestamp`], but a bare date means the last millisecond of that day.
pub(crate) fn parse_end_timestamp(s: &str) -> Result<NaiveDateTime> {
    match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        Ok(date) => Ok(end_of_day(date)),
        Err(_) => parse_timestamp(s),
    }
}

/// Truncate to whole milliseconds, the resolution of [`STORAGE_FORMAT`].
pub(crate) fn to_storage_precision(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(dt.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(dt)
}

pub(crate) fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

pub(crate) fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + chrono::Duration::days(1) - chrono::Duration::milliseconds(1)
}

pub(crate) fn now() -> NaiveDateTime {
    to_storage_precision(Local::now().naive_local())
}
