use crate::{
    Config, FetchError, StationId, StationInfo, StationLocation, WeatherReport,
    provider::avwx::AvwxSource,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod avwx;

/// The three upstream calls the lookup core depends on.
#[async_trait]
pub trait ReportSource: Send + Sync + Debug {
    /// Latest report for `id`. `Ok(None)` means the station has no report.
    async fn fetch_report(&self, id: &StationId) -> Result<Option<WeatherReport>, FetchError>;

    /// Location and declared nearest stations for `id`. Missing data is
    /// represented as absent fields, not as an error.
    async fn fetch_station(&self, id: &StationId) -> Result<StationInfo, FetchError>;

    /// Stations around `location`, closest first.
    async fn search_nearby(&self, location: StationLocation) -> Result<Vec<StationId>, FetchError>;
}

/// Construct the AVWX source from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Arc<dyn ReportSource>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No AVWX API key configured.\n\
                 Hint: run `metar configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let source = AvwxSource::new(
        api_key,
        config.base_url(),
        Duration::from_secs(config.timeout_secs()),
    )?;

    Ok(Arc::new(source))
}
