//! Timestamp parsing and UTC-to-local rewriting of raw payload trees.
//!
//! Meteosource is always queried in UTC. When a caller asks for another
//! timezone, every date-like string in the decoded payload is shifted into
//! that zone before any collection is built, so downstream code can treat
//! all strings as local wall-clock times of a single zone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::error::{MeteoError, Result};

/// Field names whose string values are timestamps in upstream payloads.
pub const DATE_FIELDS: [&str; 5] = ["date", "rise", "set", "onset", "expires"];

/// Timezone-naive serialization used for every rewritten timestamp.
pub const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse an IANA timezone name such as `Europe/London`.
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| MeteoError::UnknownTimezone(name.to_string()))
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Resolve a wall-clock time in `tz`.
///
/// Repeated local times (DST fall-back) take the earlier instant. Times
/// skipped by a DST gap move forward by the length of the gap, so midnight
/// on a day whose clocks jump at 00:00 becomes 01:00.
pub fn resolve_local(naive: &NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(*naive - Duration::days(1)))
                .fix()
                .local_minus_utc();
            tz.from_utc_datetime(&(*naive - Duration::seconds(i64::from(before))))
        }
    }
}

/// Parse `value` as an instant.
///
/// Strings carrying an explicit offset keep it; timezone-naive strings are
/// read as wall-clock time in `tz` and resolved with [`resolve_local`].
pub fn parse_in_tz(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&tz));
    }
    parse_naive(value).map(|naive| resolve_local(&naive, tz))
}

/// Parse an upstream timestamp. Strings without an offset are UTC.
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => parse_naive(value).map(|naive| naive.and_utc()),
    }
}

fn shift_from_utc(field: &str, value: &str, tz: Tz) -> Result<String> {
    let utc = parse_utc(value).ok_or_else(|| MeteoError::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    })?;
    Ok(utc.with_timezone(&tz).format(LOCAL_FORMAT).to_string())
}

/// Return a copy of `value` with every [`DATE_FIELDS`] string moved from UTC
/// into `tz`. Structure and all other values are preserved.
pub fn convert_to_timezone(value: &Value, tz: Tz) -> Result<Value> {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, part) in map {
                let converted = match part {
                    Value::String(s) if DATE_FIELDS.contains(&key.as_str()) => {
                        Value::String(shift_from_utc(key, s, tz)?)
                    }
                    other => convert_to_timezone(other, tz)?,
                };
                out.insert(key.clone(), converted);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| convert_to_timezone(item, tz))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        scalar => Ok(scalar.clone()),
    }
}

/// Convert a whole response unless the target zone is UTC, in which case
/// the payload is returned untouched.
pub fn localize(value: Value, tz: Tz) -> Result<Value> {
    if tz == Tz::UTC {
        return Ok(value);
    }
    convert_to_timezone(&value, tz)
}
