use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, StationIdError};

/// Uppercase station code such as `KJFK`.
///
/// Always non-empty ASCII alphanumerics, so it can be placed in a URL path
/// segment as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    pub fn parse(input: &str) -> Result<Self, StationIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(StationIdError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StationIdError::InvalidCharacter { input: input.to_string() });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StationId {
    type Err = StationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StationId {
    type Error = StationIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

/// A decoded METAR. Only `raw` is guaranteed; everything else is whatever the
/// upstream was able to supply.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub raw: String,
    pub station: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
    /// Degrees true. `None` for variable or unreported wind.
    pub wind_direction_deg: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    /// Visibility as reported, e.g. `10` or `P6SM`.
    pub visibility: Option<String>,
    pub temperature: Option<f64>,
    pub dewpoint: Option<f64>,
    pub altimeter: Option<f64>,
    pub clouds: Vec<String>,
    pub flight_rules: Option<String>,
}

impl WeatherReport {
    /// A report carrying only its raw text.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            station: None,
            observed_at: None,
            wind_direction_deg: None,
            wind_speed: None,
            wind_gust: None,
            visibility: None,
            temperature: None,
            dewpoint: None,
            altimeter: None,
            clouds: Vec::new(),
            flight_rules: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Stations ordered by proximity rank, closest first.
pub type CandidateList = Vec<StationId>;

/// What the upstream knows about a station that might help find a nearby report.
#[derive(Debug, Clone, PartialEq)]
pub struct StationInfo {
    pub station: StationId,
    pub location: Option<StationLocation>,
    pub nearest: CandidateList,
}

impl StationInfo {
    pub fn unknown(station: StationId) -> Self {
        Self { station, location: None, nearest: Vec::new() }
    }

    /// True when there is nothing to base a fallback search on.
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.nearest.is_empty()
    }
}

/// Where a fallback candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    DeclaredNearest,
    Proximity,
}

impl FallbackStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStrategy::DeclaredNearest => "declared-nearest",
            FallbackStrategy::Proximity => "proximity",
        }
    }
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackHit {
    pub station: StationId,
    pub report: WeatherReport,
    pub strategy: FallbackStrategy,
}

/// Why no report could be produced at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Station metadata had neither a location nor a nearest-station list.
    NoStationData,
    /// Every candidate was tried without finding a report.
    NoNearbyReport,
}

/// Result of a single lookup, for the command layer to turn into a reply.
#[derive(Debug)]
pub enum Outcome {
    DirectHit(WeatherReport),
    FallbackHit(FallbackHit),
    Unresolvable(Unresolved),
    Error(FetchError),
}

impl Outcome {
    /// The report carried by either kind of hit.
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            Outcome::DirectHit(report) => Some(report),
            Outcome::FallbackHit(hit) => Some(&hit.report),
            Outcome::Unresolvable(_) | Outcome::Error(_) => None,
        }
    }
}
