//! Core library for the `meteosource` CLI.
//!
//! This crate defines:
//! - Timezone-normalized, indexable collections of weather timesteps
//! - Forecast and archive aggregates built from API responses
//! - Request validation and the HTTP transport for the Meteosource API
//! - Configuration & credentials handling
//!
//! It is used by `meteosource-cli`, but can also be reused by other binaries or services.

pub mod alerts;
pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod point;
pub mod request;
pub mod series;
pub mod site;
pub mod timezone;

#[cfg(test)]
mod fixtures;

pub use alerts::AlertCollection;
pub use archive::{Archive, DayFetch};
pub use client::{Endpoint, HttpTransport, Meteosource, Transport};
pub use config::{ClientConfig, Config, Tier};
pub use error::{MeteoError, Result};
pub use forecast::Forecast;
pub use point::TimePoint;
pub use request::{ArchiveRequest, Location, PointRequest, Section, Units};
pub use series::{SeriesKind, TimeSeriesCollection};
pub use site::Site;
