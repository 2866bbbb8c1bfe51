use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{MeteoError, Result},
    point::TimePoint,
    timezone::{DATE_FIELDS, localize, parse_in_tz, parse_utc},
};

/// Which response section a collection was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Current,
    Minutely,
    Hourly,
    Daily,
    Archive,
    Alerts,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Current => "current",
            SeriesKind::Minutely => "minutely",
            SeriesKind::Hourly => "hourly",
            SeriesKind::Daily => "daily",
            SeriesKind::Archive => "archive",
            SeriesKind::Alerts => "alerts",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::Current => "Current",
            SeriesKind::Minutely => "Minutely",
            SeriesKind::Hourly => "Hourly",
            SeriesKind::Daily => "Daily",
            SeriesKind::Archive => "Archive",
            SeriesKind::Alerts => "Alerts",
        }
    }

    /// Record field that keys each timestep of this section.
    pub fn date_field(&self) -> &'static str {
        match self {
            SeriesKind::Daily => "day",
            SeriesKind::Alerts => "onset",
            _ => "date",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, immutable series of [`TimePoint`]s with lookup by position,
/// exact date string, or instant.
///
/// All three views are built once in [`TimeSeriesCollection::from_records`]
/// and share positions: entry `i` of `date_strings` and `instants` always
/// describes `points[i]`.
#[derive(Debug, Clone)]
pub struct TimeSeriesCollection {
    kind: SeriesKind,
    timezone: Tz,
    points: Vec<TimePoint>,
    date_strings: Vec<String>,
    instants: Vec<DateTime<Tz>>,
}

impl TimeSeriesCollection {
    /// Build from records whose date strings are already expressed in
    /// `timezone`. Instants are resolved with [`crate::timezone::resolve_local`], so a
    /// repeated local hour maps to its earlier occurrence.
    pub fn from_records(records: Vec<Value>, timezone: Tz, kind: SeriesKind) -> Result<Self> {
        let instants = records
            .iter()
            .map(|record| {
                let date = date_of(record, kind)?;
                parse_in_tz(date, timezone).ok_or_else(|| invalid(kind, date))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::build(records, instants, timezone, kind)
    }

    /// Build from upstream records whose timestamps are UTC, presenting them
    /// in `timezone`.
    ///
    /// Instants come from the UTC strings before conversion, so records in
    /// a repeated local hour keep distinct instants. Keys that are not
    /// shifted by conversion (the daily `day`) are local dates and resolve
    /// to the first instant of that day.
    pub fn from_utc_records(records: Vec<Value>, timezone: Tz, kind: SeriesKind) -> Result<Self> {
        let shifted = DATE_FIELDS.contains(&kind.date_field());
        let instants = records
            .iter()
            .map(|record| {
                let date = date_of(record, kind)?;
                let instant = if shifted {
                    parse_utc(date).map(|utc| utc.with_timezone(&timezone))
                } else {
                    parse_in_tz(date, timezone)
                };
                instant.ok_or_else(|| invalid(kind, date))
            })
            .collect::<Result<Vec<_>>>()?;

        let records = records
            .into_iter()
            .map(|record| localize(record, timezone))
            .collect::<Result<Vec<_>>>()?;

        Self::build(records, instants, timezone, kind)
    }

    /// Build from an upstream response section of shape `{"data": [...]}`.
    pub fn from_section(section: Value, timezone: Tz, kind: SeriesKind) -> Result<Self> {
        Self::from_utc_records(section_records(section, kind)?, timezone, kind)
    }

    fn build(
        records: Vec<Value>,
        instants: Vec<DateTime<Tz>>,
        timezone: Tz,
        kind: SeriesKind,
    ) -> Result<Self> {
        let mut points = Vec::with_capacity(records.len());
        let mut date_strings = Vec::with_capacity(records.len());

        for record in records {
            date_strings.push(date_of(&record, kind)?.to_string());
            points.push(TimePoint::from_value(record)?);
        }

        debug!(%kind, len = points.len(), timezone = %timezone, "built time series");

        Ok(Self {
            kind,
            timezone,
            points,
            date_strings,
            instants,
        })
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn by_position(&self, index: usize) -> Result<&TimePoint> {
        self.points.get(index).ok_or(MeteoError::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    /// Exact match against the record's date string, e.g. `2021-09-08T11:00:00`.
    /// The first matching record wins.
    pub fn by_date_str(&self, date: &str) -> Result<&TimePoint> {
        self.date_strings
            .iter()
            .position(|candidate| candidate == date)
            .map(|index| &self.points[index])
            .ok_or_else(|| MeteoError::NotFound(format!("date '{date}'")))
    }

    /// Match an instant from any zone by its wall-clock time in this
    /// collection's zone. The first matching record wins.
    pub fn by_instant<Z: TimeZone>(&self, at: &DateTime<Z>) -> Result<&TimePoint> {
        let local = at.with_timezone(&self.timezone).naive_local();
        self.position_of_local(&local)
            .map(|index| &self.points[index])
            .ok_or_else(|| MeteoError::NotFound(format!("instant {local} ({})", self.timezone)))
    }

    /// Match a wall-clock time read in `source`, or in the collection's own
    /// zone when `source` is `None`.
    pub fn by_local(&self, local: &NaiveDateTime, source: Option<Tz>) -> Result<&TimePoint> {
        match source {
            Some(tz) if tz != self.timezone => {
                let at = tz.from_local_datetime(local).earliest().ok_or_else(|| {
                    MeteoError::NotFound(format!("local time {local} does not exist in {tz}"))
                })?;
                self.by_instant(&at)
            }
            _ => self
                .position_of_local(local)
                .map(|index| &self.points[index])
                .ok_or_else(|| MeteoError::NotFound(format!("local time {local}"))),
        }
    }

    fn position_of_local(&self, local: &NaiveDateTime) -> Option<usize> {
        self.instants
            .iter()
            .position(|instant| instant.naive_local() == *local)
    }

    pub fn first(&self) -> Option<&TimePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }

    /// Each call returns a fresh iterator in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, TimePoint> {
        self.points.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.date_strings.iter().map(String::as_str)
    }

    /// Absolute instant of every record, in insertion order.
    pub fn instants(&self) -> &[DateTime<Tz>] {
        &self.instants
    }
}

impl<'a> IntoIterator for &'a TimeSeriesCollection {
    type Item = &'a TimePoint;
    type IntoIter = std::slice::Iter<'a, TimePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for TimeSeriesCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} data with {} timesteps",
            self.kind.label(),
            self.len()
        )?;
        if let (Some(first), Some(last)) = (self.date_strings.first(), self.date_strings.last()) {
            write!(f, " from {first} to {last}")?;
        }
        f.write_str(">")
    }
}

fn date_of(record: &Value, kind: SeriesKind) -> Result<&str> {
    let field = kind.date_field();
    match record.get(field) {
        Some(Value::String(date)) => Ok(date),
        Some(_) => Err(MeteoError::Payload(format!(
            "{kind} record has a non-string '{field}' field"
        ))),
        None => Err(MeteoError::MissingField(field.to_string())),
    }
}

fn invalid(kind: SeriesKind, date: &str) -> MeteoError {
    MeteoError::InvalidTimestamp {
        field: kind.date_field().to_string(),
        value: date.to_string(),
    }
}

/// Pull the `data` array out of a `{"data": [...]}` section.
pub(crate) fn section_records(section: Value, kind: SeriesKind) -> Result<Vec<Value>> {
    match section {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(MeteoError::Payload(format!(
                "'data' of the {kind} section is not an array"
            ))),
        },
        _ => Err(MeteoError::Payload(format!(
            "{kind} section is not an object"
        ))),
    }
}
