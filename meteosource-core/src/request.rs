//! Request parameters for the `point` and `time_machine` endpoints.
//!
//! Everything here is validated before any network call is made.

use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::{
    error::{MeteoError, Result},
    timezone::parse_tz,
};

pub(crate) type Params = Vec<(&'static str, String)>;

/// Forecast sections that can be requested from the `point` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Current,
    Minutely,
    Hourly,
    Daily,
    Alerts,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Current => "current",
            Section::Minutely => "minutely",
            Section::Hourly => "hourly",
            Section::Daily => "daily",
            Section::Alerts => "alerts",
        }
    }

    pub const fn all() -> &'static [Section] {
        &[
            Section::Current,
            Section::Minutely,
            Section::Hourly,
            Section::Daily,
            Section::Alerts,
        ]
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Section {
    type Error = MeteoError;

    fn try_from(value: &str) -> Result<Self> {
        Section::all()
            .iter()
            .copied()
            .find(|section| section.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                MeteoError::InvalidArgument(format!(
                    "unknown section '{value}'; expected one of current, minutely, hourly, daily, alerts"
                ))
            })
    }
}

/// Unit system of returned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Units {
    #[default]
    Auto,
    Metric,
    Us,
    Uk,
    Ca,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Auto => "auto",
            Units::Metric => "metric",
            Units::Us => "us",
            Units::Uk => "uk",
            Units::Ca => "ca",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = MeteoError;

    fn try_from(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(Units::Auto),
            "metric" => Ok(Units::Metric),
            "us" => Ok(Units::Us),
            "uk" => Ok(Units::Uk),
            "ca" => Ok(Units::Ca),
            _ => Err(MeteoError::InvalidArgument(format!(
                "unknown units '{value}'; expected one of auto, metric, us, uk, ca"
            ))),
        }
    }
}

/// Either a Meteosource place identifier or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Place(String),
    Coordinates { lat: f64, lon: f64 },
}

impl Location {
    /// Exactly one of `place_id` or the full `lat`/`lon` pair must be set.
    pub fn resolve(place_id: Option<&str>, lat: Option<f64>, lon: Option<f64>) -> Result<Self> {
        match (place_id, lat, lon) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(MeteoError::InvalidArgument(
                "when place_id is specified, both lat and lon have to be unset".into(),
            )),
            (Some(place), None, None) => Ok(Location::Place(place.to_string())),
            (None, Some(lat), Some(lon)) => Ok(Location::Coordinates { lat, lon }),
            (None, _, _) => Err(MeteoError::InvalidArgument(
                "no place_id or both lat and lon specified".into(),
            )),
        }
    }

    fn push_params(&self, params: &mut Params) {
        match self {
            Location::Place(place) => params.push(("place_id", place.clone())),
            Location::Coordinates { lat, lon } => {
                params.push(("lat", lat.to_string()));
                params.push(("lon", lon.to_string()));
            }
        }
    }
}

/// Parameters of a point forecast.
#[derive(Debug, Clone)]
pub struct PointRequest {
    pub place_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub sections: Vec<Section>,
    /// IANA name of the zone dates are presented in.
    pub timezone: String,
    pub language: String,
    pub units: Units,
}

impl Default for PointRequest {
    fn default() -> Self {
        Self {
            place_id: None,
            lat: None,
            lon: None,
            sections: vec![Section::Current, Section::Hourly],
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            units: Units::Auto,
        }
    }
}

impl PointRequest {
    pub fn for_place(place_id: impl Into<String>) -> Self {
        Self {
            place_id: Some(place_id.into()),
            ..Self::default()
        }
    }

    pub fn for_coordinates(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Self::default()
        }
    }

    pub fn sections(mut self, sections: &[Section]) -> Self {
        self.sections = sections.to_vec();
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Validate and produce the target zone and query parameters.
    /// Upstream is always asked for UTC.
    pub(crate) fn prepare(&self) -> Result<(Tz, Params)> {
        let location = Location::resolve(self.place_id.as_deref(), self.lat, self.lon)?;
        let timezone = parse_tz(&self.timezone)?;

        let mut params = Params::new();
        location.push_params(&mut params);
        let sections: Vec<&str> = self.sections.iter().map(Section::as_str).collect();
        params.push(("sections", sections.join(",")));
        params.push(("units", self.units.as_str().to_string()));
        params.push(("language", self.language.clone()));
        params.push(("timezone", "UTC".to_string()));

        Ok((timezone, params))
    }
}

/// Parameters of an archive request: either explicit `dates` or an
/// inclusive `date_from..=date_to` range.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub dates: Vec<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub place_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: String,
    pub units: Units,
}

impl Default for ArchiveRequest {
    fn default() -> Self {
        Self {
            dates: Vec::new(),
            date_from: None,
            date_to: None,
            place_id: None,
            lat: None,
            lon: None,
            timezone: "UTC".to_string(),
            units: Units::Auto,
        }
    }
}

impl ArchiveRequest {
    pub fn for_place(place_id: impl Into<String>) -> Self {
        Self {
            place_id: Some(place_id.into()),
            ..Self::default()
        }
    }

    pub fn for_coordinates(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Self::default()
        }
    }

    pub fn dates(mut self, dates: &[NaiveDate]) -> Self {
        self.dates = dates.to_vec();
        self
    }

    pub fn range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Days to fetch, in request order.
    pub fn days(&self) -> Result<Vec<NaiveDate>> {
        let has_range_bound = self.date_from.is_some() || self.date_to.is_some();

        if !self.dates.is_empty() {
            if has_range_bound {
                return Err(MeteoError::InvalidArgument(
                    "when date is specified, both date_from and date_to have to be unset".into(),
                ));
            }
            return Ok(self.dates.clone());
        }

        let (Some(from), Some(to)) = (self.date_from, self.date_to) else {
            return Err(MeteoError::InvalidArgument(
                "date or both date_from and date_to have to be specified".into(),
            ));
        };

        let days: Vec<NaiveDate> = from.iter_days().take_while(|day| *day <= to).collect();
        if days.is_empty() {
            return Err(MeteoError::InvalidArgument(format!(
                "date_from {from} is after date_to {to}"
            )));
        }
        Ok(days)
    }

    /// Validate and produce the target zone, days, and per-request
    /// parameters shared by every day.
    pub(crate) fn prepare(&self) -> Result<(Tz, Vec<NaiveDate>, Params)> {
        let days = self.days()?;
        let location = Location::resolve(self.place_id.as_deref(), self.lat, self.lon)?;
        let timezone = parse_tz(&self.timezone)?;

        let mut params = Params::new();
        location.push_params(&mut params);
        params.push(("units", self.units.as_str().to_string()));
        params.push(("timezone", "UTC".to_string()));

        Ok((timezone, days, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn place_or_coordinates_required() {
        let err = PointRequest::default().prepare().unwrap_err();
        assert!(err.to_string().contains("no place_id or both lat and lon specified"));

        let half = PointRequest {
            lat: Some(34.05),
            ..PointRequest::default()
        };
        assert!(matches!(half.prepare(), Err(MeteoError::InvalidArgument(_))));
    }

    #[test]
    fn place_and_coordinates_are_exclusive() {
        let request = PointRequest {
            lat: Some(34.05),
            lon: Some(-118.24),
            ..PointRequest::for_place("los-angeles")
        };
        let err = request.prepare().unwrap_err();
        assert!(err.to_string().contains("when place_id is specified"));
    }

    #[test]
    fn point_params_always_ask_for_utc() {
        let (tz, params) = PointRequest::for_coordinates(51.5, -0.12)
            .sections(&[Section::Hourly, Section::Alerts])
            .timezone("Asia/Kabul")
            .units(Units::Metric)
            .prepare()
            .unwrap();

        assert_eq!(tz, chrono_tz::Asia::Kabul);
        assert_eq!(param(&params, "lat"), Some("51.5"));
        assert_eq!(param(&params, "lon"), Some("-0.12"));
        assert_eq!(param(&params, "place_id"), None);
        assert_eq!(param(&params, "sections"), Some("hourly,alerts"));
        assert_eq!(param(&params, "units"), Some("metric"));
        assert_eq!(param(&params, "language"), Some("en"));
        assert_eq!(param(&params, "timezone"), Some("UTC"));
    }

    #[test]
    fn unknown_timezone_is_rejected_early() {
        let err = PointRequest::for_place("london")
            .timezone("Nowhere/Special")
            .prepare()
            .unwrap_err();
        assert!(matches!(err, MeteoError::UnknownTimezone(_)));
    }

    #[test]
    fn date_or_range_required() {
        let err = ArchiveRequest::for_place("london").days().unwrap_err();
        assert!(err.to_string().contains("date or both date_from and date_to"));

        let half = ArchiveRequest {
            date_from: Some(day("2022-06-05")),
            ..ArchiveRequest::for_place("london")
        };
        assert!(half.days().is_err());
    }

    #[test]
    fn date_and_range_are_exclusive() {
        let err = ArchiveRequest::for_place("london")
            .dates(&[day("2022-06-10")])
            .range(day("2022-06-05"), day("2022-06-12"))
            .days()
            .unwrap_err();
        assert!(err.to_string().contains("when date is specified"));
    }

    #[test]
    fn archive_validation_precedes_location_checks() {
        let err = ArchiveRequest::default().prepare().unwrap_err();
        assert!(err.to_string().contains("date or both"));

        let err = ArchiveRequest::default()
            .dates(&[day("2022-07-01")])
            .prepare()
            .unwrap_err();
        assert!(err.to_string().contains("no place_id"));
    }

    #[test]
    fn range_expands_inclusively() {
        let days = ArchiveRequest::for_place("london")
            .range(day("2020-10-30"), day("2020-11-02"))
            .days()
            .unwrap();
        assert_eq!(
            days,
            vec![day("2020-10-30"), day("2020-10-31"), day("2020-11-01"), day("2020-11-02")]
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = ArchiveRequest::for_place("london")
            .range(day("2020-10-03"), day("2020-10-01"))
            .days()
            .unwrap_err();
        assert!(matches!(err, MeteoError::InvalidArgument(_)));
    }

    #[test]
    fn explicit_dates_keep_their_order() {
        let dates = [day("2020-11-03"), day("2020-10-01"), day("2020-10-02")];
        let days = ArchiveRequest::for_place("london").dates(&dates).days().unwrap();
        assert_eq!(days, dates.to_vec());
    }

    #[test]
    fn section_and_units_parsing() {
        assert_eq!(Section::try_from("Hourly").unwrap(), Section::Hourly);
        assert!(Section::try_from("weekly").is_err());
        assert_eq!(Units::try_from("UK").unwrap(), Units::Uk);
        assert!(Units::try_from("imperial").is_err());
        for section in Section::all() {
            assert_eq!(Section::try_from(section.as_str()).unwrap(), *section);
        }
    }
}
