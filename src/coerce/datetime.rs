//! Date/time parsing and zone normalization.
//!
//! Incoming timestamps either carry a zone designator (`Z`, `+02:00`) or do not. Zoned values are
//! held as the equivalent UTC instant; zone-less values stay as wall-clock time until
//! [`normalize_datetimes`] reinterprets them as UTC (same numbers, no shifting).

use crate::coerce::{FieldValue, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a date-time string. Returns None when no supported format matches.
pub fn parse_datetime(s: &str) -> Option<FieldValue> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(FieldValue::DateTime(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(FieldValue::DateTime(dt.with_timezone(&Utc)));
    }
    for fmt in LOCAL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(FieldValue::LocalDateTime(dt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(FieldValue::LocalDateTime)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| match parse_datetime(s)? {
        FieldValue::DateTime(dt) => Some(dt.date_naive()),
        FieldValue::LocalDateTime(dt) => Some(dt.date()),
        _ => None,
    })
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Reinterpret every zone-less timestamp in the record as UTC, keeping wall-clock numbers.
pub fn normalize_datetimes(record: &mut Record) {
    for value in record.values_mut() {
        if let FieldValue::LocalDateTime(naive) = value {
            *value = FieldValue::DateTime(naive.and_utc());
        }
    }
}
