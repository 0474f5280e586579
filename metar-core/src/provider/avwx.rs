//! [AVWX](https://avwx.rest) REST client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{FetchError, StationId, StationInfo, StationLocation, WeatherReport};

use super::ReportSource;

#[derive(Debug, Clone)]
pub struct AvwxSource {
    http: Client,
    base_url: String,
}

impl AvwxSource {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| FetchError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder().default_headers(headers).timeout(timeout).build()?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ReportSource for AvwxSource {
    async fn fetch_report(&self, id: &StationId) -> Result<Option<WeatherReport>, FetchError> {
        let url = self.endpoint(&format!("metar/{id}"));
        debug!(station = %id, %url, "fetching METAR");

        let res = self.http.get(&url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!(station = %id, "no METAR published");
            return Ok(None);
        }

        let body = success_body(res).await?;
        let parsed: AvwxMetar =
            serde_json::from_str(&body).map_err(|e| FetchError::Json(e.to_string()))?;
        if let Some(message) = embedded_error(parsed.error.as_ref()) {
            return Err(FetchError::Upstream(message));
        }

        Ok(parsed.into_report())
    }

    async fn fetch_station(&self, id: &StationId) -> Result<StationInfo, FetchError> {
        let url = self.endpoint(&format!("station/{id}"));
        debug!(station = %id, %url, "fetching station metadata");

        let res = self.http.get(&url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(StationInfo::unknown(id.clone()));
        }

        let body = success_body(res).await?;
        let parsed: AvwxStation = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(station = %id, error = %e, "malformed station metadata; treating as unknown");
                return Ok(StationInfo::unknown(id.clone()));
            }
        };
        if let Some(message) = embedded_error(parsed.error.as_ref()) {
            return Err(FetchError::Upstream(message));
        }

        Ok(parsed.into_info(id))
    }

    async fn search_nearby(&self, location: StationLocation) -> Result<Vec<StationId>, FetchError> {
        let url = self.endpoint(&format!(
            "station/nearby/{},{}",
            location.latitude, location.longitude
        ));
        debug!(%url, "searching nearby stations");

        let res = self.http.get(&url).send().await?;
        let body = success_body(res).await?;
        let parsed: AvwxNearby =
            serde_json::from_str(&body).map_err(|e| FetchError::Json(e.to_string()))?;

        match parsed {
            AvwxNearby::Stations(entries) => Ok(candidates_from_entries(&entries)),
            AvwxNearby::Other { error } => match embedded_error(error.as_ref()) {
                Some(message) => Err(FetchError::Upstream(message)),
                None => Err(FetchError::Json("nearby search did not return a list".to_string())),
            },
        }
    }
}

/// Deserializes to `None` when the field is null or has an unexpected shape,
/// so one odd field never sinks the whole payload.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Debug, Deserialize)]
struct AvwxValue {
    #[serde(default, deserialize_with = "lenient")]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AvwxRepr {
    #[serde(default, deserialize_with = "lenient")]
    repr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvwxTime {
    #[serde(default, deserialize_with = "lenient")]
    dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AvwxMetar {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    raw: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    station: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    time: Option<AvwxTime>,
    #[serde(default, deserialize_with = "lenient")]
    wind_direction: Option<AvwxValue>,
    #[serde(default, deserialize_with = "lenient")]
    wind_speed: Option<AvwxValue>,
    #[serde(default, deserialize_with = "lenient")]
    wind_gust: Option<AvwxValue>,
    #[serde(default, deserialize_with = "lenient")]
    visibility: Option<AvwxRepr>,
    #[serde(default, deserialize_with = "lenient")]
    temperature: Option<AvwxValue>,
    #[serde(default, deserialize_with = "lenient")]
    dewpoint: Option<AvwxValue>,
    #[serde(default, deserialize_with = "lenient")]
    altimeter: Option<AvwxValue>,
    #[serde(default, deserialize_with = "lenient")]
    clouds: Option<Vec<AvwxRepr>>,
    #[serde(default, deserialize_with = "lenient")]
    flight_rules: Option<String>,
}

impl AvwxMetar {
    /// `None` when there is no usable raw text.
    fn into_report(self) -> Option<WeatherReport> {
        let value = |v: Option<AvwxValue>| v.and_then(|v| v.value);
        let repr = |r: AvwxRepr| non_blank(r.repr);

        Some(WeatherReport {
            raw: non_blank(self.raw)?,
            station: non_blank(self.station),
            observed_at: self.time.and_then(|t| t.dt),
            wind_direction_deg: value(self.wind_direction),
            wind_speed: value(self.wind_speed),
            wind_gust: value(self.wind_gust),
            visibility: self.visibility.and_then(repr),
            temperature: value(self.temperature),
            dewpoint: value(self.dewpoint),
            altimeter: value(self.altimeter),
            clouds: self.clouds.unwrap_or_default().into_iter().filter_map(repr).collect(),
            flight_rules: non_blank(self.flight_rules),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AvwxStation {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    nearest: Option<Vec<Value>>,
}

impl AvwxStation {
    fn into_info(self, id: &StationId) -> StationInfo {
        let latitude = self.latitude.filter(|lat| (-90.0..=90.0).contains(lat));
        let longitude = self.longitude.filter(|lon| (-180.0..=180.0).contains(lon));

        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(StationLocation { latitude, longitude }),
            _ => None,
        };

        StationInfo {
            station: id.clone(),
            location,
            nearest: candidates_from_entries(&self.nearest.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AvwxNearby {
    Stations(Vec<Value>),
    Other {
        #[serde(default)]
        error: Option<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct AvwxNestedStation {
    #[serde(default, deserialize_with = "lenient")]
    icao: Option<String>,
}

/// A list entry naming a station: a bare code, `{"icao": ..}` or
/// `{"station": {"icao": ..}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AvwxStationRef {
    Code(String),
    Record {
        #[serde(default, deserialize_with = "lenient")]
        icao: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        station: Option<AvwxNestedStation>,
    },
}

impl AvwxStationRef {
    fn code(self) -> Option<String> {
        match self {
            AvwxStationRef::Code(code) => Some(code),
            AvwxStationRef::Record { icao, station } => icao.or_else(|| station.and_then(|s| s.icao)),
        }
    }
}

/// Station codes from a ranked list. Order is kept, duplicates and unusable
/// entries are dropped.
fn candidates_from_entries(entries: &[Value]) -> Vec<StationId> {
    let mut out: Vec<StationId> = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(id) = AvwxStationRef::deserialize(entry)
            .ok()
            .and_then(AvwxStationRef::code)
            .and_then(|c| StationId::parse(&c).ok())
        else {
            continue;
        };
        if !out.contains(&id) {
            out.push(id);
        }
    }

    out
}

async fn success_body(res: Response) -> Result<String, FetchError> {
    let status = res.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Unauthorized);
    }

    let body = res.text().await?;
    if !status.is_success() {
        return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
    }

    Ok(body)
}

/// The `error` field of a payload, if it carries anything meaningful.
fn embedded_error(error: Option<&Value>) -> Option<String> {
    match error? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
