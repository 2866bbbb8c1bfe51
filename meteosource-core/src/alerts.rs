use std::{fmt, ops::Deref};

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::{
    error::{MeteoError, Result},
    point::TimePoint,
    series::{SeriesKind, TimeSeriesCollection, section_records},
    timezone::{parse_in_tz, parse_utc},
};

/// Weather alerts, each valid from `onset` to `expires` inclusive.
///
/// Dereferences to the underlying [`TimeSeriesCollection`], keyed by `onset`.
#[derive(Debug, Clone)]
pub struct AlertCollection {
    series: TimeSeriesCollection,
    windows: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl AlertCollection {
    /// Build from alerts whose `onset`/`expires` strings are already in
    /// `timezone`.
    pub fn from_records(records: Vec<Value>, timezone: Tz) -> Result<Self> {
        let windows = windows(&records, |raw| {
            parse_in_tz(raw, timezone).map(|dt| dt.with_timezone(&Utc))
        })?;
        let series = TimeSeriesCollection::from_records(records, timezone, SeriesKind::Alerts)?;
        Ok(Self { series, windows })
    }

    /// Build from upstream alerts with UTC timestamps. Windows are taken
    /// from the UTC values, so bounds inside a repeated local hour stay exact.
    pub fn from_utc_records(records: Vec<Value>, timezone: Tz) -> Result<Self> {
        let windows = windows(&records, parse_utc)?;
        let series = TimeSeriesCollection::from_utc_records(records, timezone, SeriesKind::Alerts)?;
        Ok(Self { series, windows })
    }

    /// Build from an upstream `{"data": [...]}` alerts section.
    pub fn from_section(section: Value, timezone: Tz) -> Result<Self> {
        Self::from_utc_records(section_records(section, SeriesKind::Alerts)?, timezone)
    }

    /// Alerts whose window contains `at`, in delivery order.
    pub fn active_at<Z: TimeZone>(&self, at: &DateTime<Z>) -> Vec<&TimePoint> {
        let at = at.with_timezone(&Utc);
        self.series
            .iter()
            .zip(&self.windows)
            .filter(|(_, (onset, expires))| *onset <= at && at <= *expires)
            .map(|(alert, _)| alert)
            .collect()
    }

    /// Like [`AlertCollection::active_at`], parsing `at` first. Strings
    /// without an offset are read in the collection's timezone.
    pub fn active_at_str(&self, at: &str) -> Result<Vec<&TimePoint>> {
        let instant =
            parse_in_tz(at, self.series.timezone()).ok_or_else(|| MeteoError::InvalidTimestamp {
                field: "at".to_string(),
                value: at.to_string(),
            })?;
        Ok(self.active_at(&instant))
    }

    pub fn active_now(&self) -> Vec<&TimePoint> {
        self.active_at(&Utc::now())
    }

    pub fn series(&self) -> &TimeSeriesCollection {
        &self.series
    }
}

fn windows<F>(records: &[Value], parse: F) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>>
where
    F: Fn(&str) -> Option<DateTime<Utc>>,
{
    let bound = |record: &Value, field: &str| {
        let raw = match record.get(field) {
            Some(Value::String(raw)) => raw.as_str(),
            Some(_) => {
                return Err(MeteoError::Payload(format!(
                    "alert has a non-string '{field}' field"
                )));
            }
            None => return Err(MeteoError::MissingField(field.to_string())),
        };
        parse(raw).ok_or_else(|| MeteoError::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        })
    };

    records
        .iter()
        .map(|record| Ok((bound(record, "onset")?, bound(record, "expires")?)))
        .collect()
}

impl Deref for AlertCollection {
    type Target = TimeSeriesCollection;

    fn deref(&self) -> &Self::Target {
        &self.series
    }
}

impl<'a> IntoIterator for &'a AlertCollection {
    type Item = &'a TimePoint;
    type IntoIter = std::slice::Iter<'a, TimePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

impl fmt::Display for AlertCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Alerts data with {} alerts>", self.series.len())
    }
}
