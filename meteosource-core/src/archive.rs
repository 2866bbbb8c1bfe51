use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::warn;

use crate::{
    error::{MeteoError, Result},
    series::{SeriesKind, TimeSeriesCollection},
    site::Site,
};

/// Outcome of fetching one archive day.
#[derive(Debug)]
pub struct DayFetch {
    pub date: NaiveDate,
    pub result: Result<Value>,
}

/// Historical weather for a location, possibly spanning several days.
#[derive(Debug, Clone)]
pub struct Archive {
    site: Site,
    timezone: Tz,
    data: Option<TimeSeriesCollection>,
    missing_days: Vec<NaiveDate>,
}

impl Archive {
    /// Build from a single `time_machine` response.
    pub fn from_payload(payload: Value, timezone: Tz) -> Result<Self> {
        let site = Site::from_payload(&payload)?;

        let Value::Object(mut fields) = payload else {
            return Err(MeteoError::Payload("archive response is not an object".into()));
        };

        let data = match fields.remove("data") {
            None | Some(Value::Null) => None,
            Some(Value::Array(records)) => Some(TimeSeriesCollection::from_utc_records(
                records,
                timezone,
                SeriesKind::Archive,
            )?),
            Some(_) => {
                return Err(MeteoError::Payload(
                    "'data' of the archive response is not an array".into(),
                ));
            }
        };

        Ok(Self {
            site,
            timezone,
            data,
            missing_days: Vec::new(),
        })
    }

    /// Merge per-day fetches in the order given, then build one series.
    ///
    /// Failed days are skipped and reported through [`Archive::missing_days`].
    /// Fails with [`MeteoError::EmptyArchive`] if no day succeeded.
    pub fn from_days(days: impl IntoIterator<Item = DayFetch>, timezone: Tz) -> Result<Self> {
        let (payload, missing_days) = merge_days(days)?;
        let mut archive = Self::from_payload(payload, timezone)?;
        archive.missing_days = missing_days;
        Ok(archive)
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn lat(&self) -> f64 {
        self.site.lat
    }

    pub fn lon(&self) -> f64 {
        self.site.lon
    }

    pub fn elevation(&self) -> i64 {
        self.site.elevation
    }

    pub fn units(&self) -> &str {
        &self.site.units
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn data(&self) -> Option<&TimeSeriesCollection> {
        self.data.as_ref()
    }

    /// Days that were requested but could not be downloaded.
    pub fn missing_days(&self) -> &[NaiveDate] {
        &self.missing_days
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Archive for lat: {}, lon: {}>", self.site.lat, self.site.lon)
    }
}

/// Concatenate the `data` arrays of successful days into the first
/// successful payload, keeping request order.
pub fn merge_days(days: impl IntoIterator<Item = DayFetch>) -> Result<(Value, Vec<NaiveDate>)> {
    let mut merged: Option<Value> = None;
    let mut records = Vec::new();
    let mut missing = Vec::new();

    for DayFetch { date, result } in days {
        match result {
            Ok(mut payload) => {
                let day_records = match payload.as_object_mut().map(|fields| fields.remove("data")) {
                    None => {
                        return Err(MeteoError::Payload(format!(
                            "archive response for {date} is not an object"
                        )));
                    }
                    Some(None | Some(Value::Null)) => Vec::new(),
                    Some(Some(Value::Array(day_records))) => day_records,
                    Some(Some(_)) => {
                        return Err(MeteoError::Payload(format!(
                            "'data' of the archive response for {date} is not an array"
                        )));
                    }
                };
                records.extend(day_records);
                if merged.is_none() {
                    merged = Some(payload);
                }
            }
            Err(err) => {
                warn!(%date, error = %err, "problem downloading archive day, skipping");
                missing.push(date);
            }
        }
    }

    let mut payload = merged.ok_or(MeteoError::EmptyArchive)?;
    if let Some(fields) = payload.as_object_mut() {
        fields.insert("data".to_string(), Value::Array(records));
    }
    Ok((payload, missing))
}
