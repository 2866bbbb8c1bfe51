use serde::Deserialize;
use serde_json::Value;

use crate::error::{MeteoError, Result};

/// Location metadata shared by every response kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub lat: f64,
    pub lon: f64,
    pub elevation: i64,
    pub units: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
struct RawSite {
    lat: RawCoordinate,
    lon: RawCoordinate,
    elevation: i64,
    units: String,
}

impl Site {
    /// Read the response header: `lat`, `lon`, `elevation`, `units`.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let raw = RawSite::deserialize(payload)?;
        Ok(Self {
            lat: coordinate(raw.lat)?,
            lon: coordinate(raw.lon)?,
            elevation: raw.elevation,
            units: raw.units,
        })
    }
}

fn coordinate(raw: RawCoordinate) -> Result<f64> {
    match raw {
        RawCoordinate::Text(text) => parse_coordinate(&text),
        RawCoordinate::Number(value) => Ok(value),
    }
}

/// Parse `12.3N`, `13.2S`, `0.1E`, `118.24W` or a plain signed number.
///
/// `N`/`E` keep the value as written, `S`/`W` negate it.
pub fn parse_coordinate(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let (number, sign) = match trimmed.chars().last() {
        Some('N' | 'E') => (&trimmed[..trimmed.len() - 1], 1.0),
        Some('S' | 'W') => (&trimmed[..trimmed.len() - 1], -1.0),
        _ => (trimmed, 1.0),
    };

    number
        .trim()
        .parse::<f64>()
        .map(|value| sign * value)
        .map_err(|_| MeteoError::InvalidCoordinate(raw.to_string()))
}
