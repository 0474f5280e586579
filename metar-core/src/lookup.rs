//! Report lookup with nearest-station fallback.
//!
//! The direct report for the requested station wins. Without one, the
//! station's metadata decides where to look next: the stations the upstream
//! declares as nearest if it lists any, otherwise whatever a proximity search
//! around the station's coordinates returns. Candidates are tried one at a
//! time in rank order and the first report found is returned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    Config, FallbackHit, FallbackStrategy, FetchError, Outcome, ReportSource, StationId,
    StationInfo, Unresolved, WeatherReport, config::DEFAULT_MAX_CANDIDATES,
};

/// Entry point for the command layer. Cheap to clone; holds no per-request state.
#[derive(Debug, Clone)]
pub struct MetarService {
    source: Arc<dyn ReportSource>,
    max_candidates: usize,
}

impl MetarService {
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        Self { source, max_candidates: DEFAULT_MAX_CANDIDATES }
    }

    pub fn from_config(source: Arc<dyn ReportSource>, config: &Config) -> Self {
        Self::new(source).with_max_candidates(config.max_candidates())
    }

    /// Cap on stations tried during one fallback search, at least one.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates.max(1);
        self
    }

    /// Direct lookup only. `Ok(None)` when the station publishes no report.
    pub async fn fetch_report(&self, id: &StationId) -> Result<Option<WeatherReport>, FetchError> {
        self.source.fetch_report(id).await
    }

    pub async fn resolve_station(&self, id: &StationId) -> Result<StationInfo, FetchError> {
        let info = self.source.fetch_station(id).await?;
        debug!(
            station = %id,
            has_location = info.location.is_some(),
            nearest = info.nearest.len(),
            "resolved station metadata"
        );
        Ok(info)
    }

    /// Try fallback candidates for `info` until one has a report.
    ///
    /// A declared nearest-station list, when present, is the only source of
    /// candidates; the proximity search runs only for stations without one.
    /// Individual candidate failures, and a failed proximity search, count as
    /// misses. Returns `None` when nothing was found.
    pub async fn find_fallback_report(&self, info: &StationInfo) -> Option<FallbackHit> {
        let mut walk = CandidateWalk::new(self.source.as_ref(), &info.station, self.max_candidates);

        if !info.nearest.is_empty() {
            return walk.first_hit(&info.nearest, FallbackStrategy::DeclaredNearest).await;
        }

        let location = info.location?;

        let candidates = match self.source.search_nearby(location).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    station = %info.station,
                    latitude = location.latitude,
                    longitude = location.longitude,
                    error = %e,
                    "nearby station search failed"
                );
                return None;
            }
        };
        debug!(station = %info.station, candidates = candidates.len(), "nearby stations found");

        walk.first_hit(&candidates, FallbackStrategy::Proximity).await
    }

    /// Best available report for `id`.
    pub async fn get_report(&self, id: &StationId) -> Outcome {
        match self.try_get_report(id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(station = %id, error = %e, "lookup failed");
                Outcome::Error(e)
            }
        }
    }

    async fn try_get_report(&self, id: &StationId) -> Result<Outcome, FetchError> {
        if let Some(report) = self.fetch_report(id).await? {
            info!(station = %id, "direct report found");
            return Ok(Outcome::DirectHit(report));
        }

        let info = self.resolve_station(id).await?;
        if info.is_empty() {
            info!(station = %id, "no report and no data to search around");
            return Ok(Outcome::Unresolvable(Unresolved::NoStationData));
        }

        Ok(match self.find_fallback_report(&info).await {
            Some(hit) => {
                info!(
                    station = %id,
                    fallback = %hit.station,
                    strategy = %hit.strategy,
                    "fallback report found"
                );
                Outcome::FallbackHit(hit)
            }
            None => {
                info!(station = %id, "no report at any nearby station");
                Outcome::Unresolvable(Unresolved::NoNearbyReport)
            }
        })
    }
}

/// Tries candidates in order for one fallback search.
struct CandidateWalk<'a> {
    source: &'a dyn ReportSource,
    /// The requested station plus every candidate already tried.
    seen: Vec<StationId>,
    remaining: usize,
}

impl<'a> CandidateWalk<'a> {
    fn new(source: &'a dyn ReportSource, requested: &StationId, budget: usize) -> Self {
        Self { source, seen: vec![requested.clone()], remaining: budget }
    }

    fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    async fn first_hit(
        &mut self,
        candidates: &[StationId],
        strategy: FallbackStrategy,
    ) -> Option<FallbackHit> {
        for candidate in candidates {
            if self.exhausted() {
                debug!(%strategy, "candidate budget used up");
                return None;
            }
            if self.seen.contains(candidate) {
                continue;
            }
            self.seen.push(candidate.clone());
            self.remaining -= 1;

            match self.source.fetch_report(candidate).await {
                Ok(Some(report)) => {
                    return Some(FallbackHit { station: candidate.clone(), report, strategy });
                }
                Ok(None) => debug!(candidate = %candidate, %strategy, "candidate has no report"),
                Err(e) => warn!(
                    candidate = %candidate,
                    %strategy,
                    timeout = e.is_timeout(),
                    error = %e,
                    "candidate fetch failed; trying next"
                ),
            }
        }

        None
    }
}
