use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};
use meteosource_core::{
    ArchiveRequest, Config, Meteosource, PointRequest, Section, Tier, Units, timezone::parse_tz,
};
use tracing::{debug, info};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteosource", version, about = "Meteosource weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where to ask for weather: a place id or a coordinate pair.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Meteosource place identifier, e.g. "london".
    pub place: Option<String>,

    /// Latitude, e.g. 51.5 or -13.4.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude, e.g. -0.12 or 14.42.
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, tier and default timezone.
    Configure,

    /// Show the forecast for a place.
    Forecast {
        #[command(flatten)]
        location: LocationArgs,

        /// Comma-separated sections: current, minutely, hourly, daily, alerts.
        #[arg(long, value_delimiter = ',', default_value = "current,hourly")]
        sections: Vec<String>,

        /// IANA timezone for presented dates; defaults to the configured one.
        #[arg(long)]
        tz: Option<String>,

        #[arg(long)]
        lang: Option<String>,

        /// auto, metric, us, uk or ca.
        #[arg(long)]
        units: Option<String>,
    },

    /// Show historical weather for one or more days.
    Archive {
        #[command(flatten)]
        location: LocationArgs,

        /// Day to fetch (YYYY-MM-DD); repeat for several days.
        #[arg(long = "date")]
        dates: Vec<NaiveDate>,

        /// First day of an inclusive range.
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day of an inclusive range.
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long)]
        tz: Option<String>,

        #[arg(long)]
        units: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Forecast {
                location,
                sections,
                tz,
                lang,
                units,
            } => {
                let config = Config::load()?;
                let request = point_request(&config, location, &sections, tz, lang, units)?;
                debug!(?request, "point forecast request");
                let client = Meteosource::new(config.client_config()?)?;

                let forecast = client
                    .point_forecast(&request)
                    .await
                    .context("Failed to fetch forecast")?;
                render::forecast(&forecast);
                Ok(())
            }
            Command::Archive {
                location,
                dates,
                from,
                to,
                tz,
                units,
            } => {
                let config = Config::load()?;
                let request = archive_request(&config, location, dates, from, to, tz, units)?;
                debug!(?request, "archive request");
                let client = Meteosource::new(config.client_config()?)?;

                let archive = client
                    .time_machine_with_progress(&request, |date| println!("Fetched {date}"))
                    .await
                    .context("Failed to fetch archive")?;
                render::archive(&archive);
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Meteosource API key:")
        .without_confirmation()
        .prompt()?;
    let tier = Select::new("Subscription tier:", Tier::all().to_vec()).prompt()?;
    let default_tz = config.timezone_or_default().to_string();
    let timezone = Text::new("Default timezone:")
        .with_default(&default_tz)
        .prompt()?;
    parse_tz(&timezone)?;

    config.api_key = Some(api_key);
    config.set_tier(tier);
    config.timezone = Some(timezone);
    config.save()?;
    info!(tier = %tier, "configuration updated");

    println!(
        "Configuration saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn units_or_default(config: &Config, units: Option<String>) -> anyhow::Result<Units> {
    match units.or_else(|| config.units.clone()) {
        Some(units) => Ok(Units::try_from(units.as_str())?),
        None => Ok(Units::Auto),
    }
}

fn point_request(
    config: &Config,
    location: LocationArgs,
    sections: &[String],
    tz: Option<String>,
    lang: Option<String>,
    units: Option<String>,
) -> anyhow::Result<PointRequest> {
    let sections = sections
        .iter()
        .map(|s| Section::try_from(s.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PointRequest {
        place_id: location.place,
        lat: location.lat,
        lon: location.lon,
        sections,
        timezone: tz.unwrap_or_else(|| config.timezone_or_default().to_string()),
        language: lang
            .or_else(|| config.language.clone())
            .unwrap_or_else(|| "en".to_string()),
        units: units_or_default(config, units)?,
    })
}

fn archive_request(
    config: &Config,
    location: LocationArgs,
    dates: Vec<NaiveDate>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    tz: Option<String>,
    units: Option<String>,
) -> anyhow::Result<ArchiveRequest> {
    Ok(ArchiveRequest {
        dates,
        date_from: from,
        date_to: to,
        place_id: location.place,
        lat: location.lat,
        lon: location.lon,
        timezone: tz.unwrap_or_else(|| config.timezone_or_default().to_string()),
        units: units_or_default(config, units)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).expect("arguments should parse").command
    }

    #[test]
    fn forecast_arguments_build_request() {
        let Command::Forecast {
            location,
            sections,
            tz,
            lang,
            units,
        } = parse(&[
            "meteosource",
            "forecast",
            "--lat",
            "34.05",
            "--lon",
            "-118.24",
            "--sections",
            "hourly,daily",
            "--units",
            "us",
        ])
        else {
            panic!("expected forecast command");
        };

        let config = Config {
            timezone: Some("America/Los_Angeles".into()),
            ..Config::default()
        };
        let request = point_request(&config, location, &sections, tz, lang, units).unwrap();

        assert_eq!(request.lat, Some(34.05));
        assert_eq!(request.lon, Some(-118.24));
        assert_eq!(request.sections, vec![Section::Hourly, Section::Daily]);
        assert_eq!(request.timezone, "America/Los_Angeles");
        assert_eq!(request.units, Units::Us);
        assert_eq!(request.language, "en");
    }

    #[test]
    fn unknown_section_is_rejected() {
        let Command::Forecast {
            location,
            sections,
            tz,
            lang,
            units,
        } = parse(&["meteosource", "forecast", "london", "--sections", "weekly"])
        else {
            panic!("expected forecast command");
        };

        let err = point_request(&Config::default(), location, &sections, tz, lang, units).unwrap_err();
        assert!(err.to_string().contains("unknown section"));
    }

    #[test]
    fn archive_arguments_build_request() {
        let Command::Archive {
            location,
            dates,
            from,
            to,
            tz,
            units,
        } = parse(&[
            "meteosource",
            "archive",
            "london",
            "--date",
            "2021-10-30",
            "--date",
            "2021-10-31",
            "--tz",
            "Europe/London",
        ])
        else {
            panic!("expected archive command");
        };

        let request = archive_request(&Config::default(), location, dates, from, to, tz, units).unwrap();

        assert_eq!(request.place_id.as_deref(), Some("london"));
        assert_eq!(request.days().unwrap().len(), 2);
        assert_eq!(request.timezone, "Europe/London");
        assert_eq!(request.units, Units::Auto);
    }
}
