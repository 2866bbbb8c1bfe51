use std::fmt;

use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::{
    alerts::AlertCollection,
    error::{MeteoError, Result},
    point::TimePoint,
    series::{SeriesKind, TimeSeriesCollection},
    site::Site,
    timezone::localize,
};

/// Forecast for a single point, as returned by the `point` endpoint.
///
/// Sections missing from the response stay `None`.
#[derive(Debug, Clone)]
pub struct Forecast {
    site: Site,
    timezone: Tz,
    current: Option<TimePoint>,
    minutely: Option<TimeSeriesCollection>,
    hourly: Option<TimeSeriesCollection>,
    daily: Option<TimeSeriesCollection>,
    alerts: Option<AlertCollection>,
}

impl Forecast {
    /// Build from a UTC payload, presenting all dates in `timezone`.
    ///
    /// Each section is converted once while it is built, so collections can
    /// keep the exact UTC instant of every record.
    pub fn from_payload(payload: Value, timezone: Tz) -> Result<Self> {
        let site = Site::from_payload(&payload)?;

        let Value::Object(mut sections) = payload else {
            return Err(MeteoError::Payload("forecast response is not an object".into()));
        };

        let current = take(&mut sections, "current")
            .map(|section| TimePoint::from_value(localize(section, timezone)?))
            .transpose()?;
        let minutely = series(&mut sections, timezone, SeriesKind::Minutely)?;
        let hourly = series(&mut sections, timezone, SeriesKind::Hourly)?;
        let daily = series(&mut sections, timezone, SeriesKind::Daily)?;
        let alerts = take(&mut sections, "alerts")
            .map(|section| AlertCollection::from_section(section, timezone))
            .transpose()?;

        Ok(Self {
            site,
            timezone,
            current,
            minutely,
            hourly,
            daily,
            alerts,
        })
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

    pub fn current(&self) -> Option<&TimePoint> {
        self.current.as_ref()
    }

    pub fn minutely(&self) -> Option<&TimeSeriesCollection> {
        self.minutely.as_ref()
    }

    pub fn hourly(&self) -> Option<&TimeSeriesCollection> {
        self.hourly.as_ref()
    }

    pub fn daily(&self) -> Option<&TimeSeriesCollection> {
        self.daily.as_ref()
    }

    pub fn alerts(&self) -> Option<&AlertCollection> {
        self.alerts.as_ref()
    }
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Forecast for lat: {}, lon: {}>", self.site.lat, self.site.lon)
    }
}

fn take(sections: &mut Map<String, Value>, name: &str) -> Option<Value> {
    sections.remove(name).filter(|value| !value.is_null())
}

fn series(
    sections: &mut Map<String, Value>,
    timezone: Tz,
    kind: SeriesKind,
) -> Result<Option<TimeSeriesCollection>> {
    take(sections, kind.as_str())
        .map(|section| TimeSeriesCollection::from_section(section, timezone, kind))
        .transpose()
}
