use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::{
    archive::{Archive, DayFetch},
    config::ClientConfig,
    error::{MeteoError, Result},
    forecast::Forecast,
    request::{ArchiveRequest, Params, PointRequest},
};

pub const API_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Point,
    TimeMachine,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Point => "point",
            Endpoint::TimeMachine => "time_machine",
        }
    }
}

/// Fetches one decoded JSON response from the API.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn fetch(&self, endpoint: Endpoint, params: &[(&'static str, String)]) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: ClientConfig,
    http: Client,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/api/{}/{}/{}",
            self.config.host,
            API_VERSION,
            self.config.tier,
            endpoint.as_str()
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, endpoint: Endpoint, params: &[(&'static str, String)]) -> Result<Value> {
        let url = self.endpoint_url(endpoint);
        debug!(%url, ?params, "sending Meteosource request");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(MeteoError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Entry point for the Meteosource API.
#[derive(Debug)]
pub struct Meteosource {
    transport: Box<dyn Transport>,
}

impl Meteosource {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(Box::new(HttpTransport::new(config)?)))
    }

    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Forecast for one place, with dates in the request's timezone.
    pub async fn point_forecast(&self, request: &PointRequest) -> Result<Forecast> {
        let (timezone, params) = request.prepare()?;
        let payload = self.transport.fetch(Endpoint::Point, &params).await?;
        Forecast::from_payload(payload, timezone)
    }

    pub async fn time_machine(&self, request: &ArchiveRequest) -> Result<Archive> {
        self.time_machine_with_progress(request, |_| {}).await
    }

    /// Fetch archive days one after another, calling `progress` after each
    /// day whether or not it succeeded.
    ///
    /// A single-day request fails on upstream errors; with several days a
    /// failing day is skipped and listed in [`Archive::missing_days`].
    pub async fn time_machine_with_progress<F>(
        &self,
        request: &ArchiveRequest,
        mut progress: F,
    ) -> Result<Archive>
    where
        F: FnMut(NaiveDate) + Send,
    {
        let (timezone, days, params) = request.prepare()?;

        if let [date] = days.as_slice() {
            let result = self.fetch_day(&params, *date).await;
            progress(*date);
            return Archive::from_payload(result?, timezone);
        }

        let mut fetched = Vec::with_capacity(days.len());
        for date in days {
            let result = self.fetch_day(&params, date).await;
            progress(date);
            fetched.push(DayFetch { date, result });
        }

        let archive = Archive::from_days(fetched, timezone)?;
        info!(
            records = archive.data().map_or(0, |data| data.len()),
            missing = archive.missing_days().len(),
            "archive merged"
        );
        Ok(archive)
    }

    async fn fetch_day(&self, params: &Params, date: NaiveDate) -> Result<Value> {
        let mut params = params.clone();
        params.push(("date", date.format("%Y-%m-%d").to_string()));
        self.transport.fetch(Endpoint::TimeMachine, &params).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Tier, fixtures, request::Section};
    use std::{collections::HashMap, sync::Mutex};

    #[derive(Debug, Default)]
    struct FakeTransport {
        archive_days: HashMap<String, Value>,
        calls: Mutex<Vec<(Endpoint, Vec<(&'static str, String)>)>>,
    }

    impl FakeTransport {
        fn with_days(days: &[&str]) -> Self {
            Self {
                archive_days: days
                    .iter()
                    .map(|day| (day.to_string(), fixtures::archive_day(day, 24)))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn fetch(&self, endpoint: Endpoint, params: &[(&'static str, String)]) -> Result<Value> {
            self.calls.lock().unwrap().push((endpoint, params.to_vec()));

            match endpoint {
                Endpoint::Point => Ok(fixtures::forecast()),
                Endpoint::TimeMachine => {
                    let date = params
                        .iter()
                        .find(|(key, _)| *key == "date")
                        .map(|(_, value)| value.as_str())
                        .unwrap_or_default();
                    self.archive_days
                        .get(date)
                        .cloned()
                        .ok_or_else(|| MeteoError::Upstream {
                            status: 400,
                            body: format!("no data for {date}"),
                        })
                }
            }
        }
    }

    /// Shares the fake with the client so calls can be inspected afterwards.
    #[derive(Debug)]
    struct Shared(std::sync::Arc<FakeTransport>);

    #[async_trait]
    impl Transport for Shared {
        async fn fetch(&self, endpoint: Endpoint, params: &[(&'static str, String)]) -> Result<Value> {
            self.0.fetch(endpoint, params).await
        }
    }

    fn client(fake: FakeTransport) -> (Meteosource, std::sync::Arc<FakeTransport>) {
        let fake = std::sync::Arc::new(fake);
        (Meteosource::with_transport(Box::new(Shared(fake.clone()))), fake)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn point_forecast_is_localized() {
        let (client, fake) = client(FakeTransport::default());
        let request = PointRequest::for_place("london")
            .sections(&[Section::Hourly, Section::Alerts])
            .timezone("Asia/Kabul");

        let forecast = client.point_forecast(&request).await.unwrap();

        let hourly = forecast.hourly().unwrap();
        assert_eq!(hourly.by_date_str("2021-09-08T15:30:00").unwrap().f64("feels_like").unwrap(), 23.2);

        let calls = fake.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Endpoint::Point);
        assert!(calls[0].1.contains(&("timezone", "UTC".to_string())));
        assert!(calls[0].1.contains(&("sections", "hourly,alerts".to_string())));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_transport() {
        let (client, fake) = client(FakeTransport::default());

        let err = client.point_forecast(&PointRequest::default()).await.unwrap_err();
        assert!(matches!(err, MeteoError::InvalidArgument(_)));

        let err = client.time_machine(&ArchiveRequest::for_place("london")).await.unwrap_err();
        assert!(matches!(err, MeteoError::InvalidArgument(_)));

        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_fetches_each_day_in_order() {
        let (client, fake) = client(FakeTransport::with_days(&["2020-10-01", "2020-10-02", "2020-10-03"]));
        let request = ArchiveRequest::for_place("london").range(day("2020-10-01"), day("2020-10-03"));

        let archive = client.time_machine(&request).await.unwrap();
        assert_eq!(archive.data().unwrap().len(), 72);

        let dates: Vec<String> = fake
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, params)| params.iter().find(|(k, _)| *k == "date").map(|(_, v)| v.clone()))
            .collect();
        assert_eq!(dates, vec!["2020-10-01", "2020-10-02", "2020-10-03"]);
    }

    #[tokio::test]
    async fn failing_day_is_skipped_and_reported_once() {
        let (client, _) = client(FakeTransport::with_days(&["2020-09-01", "2020-10-01"]));
        let request =
            ArchiveRequest::for_place("london").dates(&[day("2020-09-01"), day("1980-10-10"), day("2020-10-01")]);

        let mut seen = Vec::new();
        let archive = client
            .time_machine_with_progress(&request, |date| seen.push(date))
            .await
            .unwrap();

        assert_eq!(archive.data().unwrap().len(), 2 * 24);
        assert_eq!(archive.missing_days(), &[day("1980-10-10")]);
        assert_eq!(seen, vec![day("2020-09-01"), day("1980-10-10"), day("2020-10-01")]);
    }

    #[tokio::test]
    async fn single_day_failure_is_fatal() {
        let (client, _) = client(FakeTransport::default());
        let request = ArchiveRequest::for_place("london").dates(&[day("1980-10-10")]);

        let mut seen = Vec::new();
        let err = client
            .time_machine_with_progress(&request, |date| seen.push(date))
            .await
            .unwrap_err();
        assert!(matches!(err, MeteoError::Upstream { status: 400, .. }));
        assert_eq!(seen, vec![day("1980-10-10")]);
    }

    #[tokio::test]
    async fn archive_in_local_time() {
        let (client, _) = client(FakeTransport::with_days(&["2021-10-30", "2021-10-31", "2021-11-01"]));
        let request = ArchiveRequest::for_place("london")
            .dates(&[day("2021-10-30"), day("2021-10-31"), day("2021-11-01")])
            .timezone("Europe/London");

        let archive = client.time_machine(&request).await.unwrap();
        let data = archive.data().unwrap();
        assert_eq!(data.by_position(25).unwrap().str("date").unwrap(), "2021-10-31T01:00:00");
        assert_eq!(archive.timezone(), chrono_tz::Europe::London);
    }

    #[test]
    fn endpoint_urls() {
        let mut config = ClientConfig::new("KEY", Tier::Flexi);
        config.host = "http://localhost:9000".into();
        let transport = HttpTransport::new(config).unwrap();

        assert_eq!(transport.endpoint_url(Endpoint::Point), "http://localhost:9000/api/v1/flexi/point");
        assert_eq!(
            transport.endpoint_url(Endpoint::TimeMachine),
            "http://localhost:9000/api/v1/flexi/time_machine"
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
