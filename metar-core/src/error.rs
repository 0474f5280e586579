//! Error types for station identifiers and upstream calls.

use thiserror::Error;

/// Why a string could not be turned into a [`StationId`](crate::StationId).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StationIdError {
    #[error("station identifier is empty")]
    Empty,

    #[error("station identifier '{input}' must contain only letters and digits")]
    InvalidCharacter { input: String },
}

/// Failure talking to the upstream weather API.
///
/// "No report for this station" is not an error; it is `Ok(None)` from
/// [`ReportSource::fetch_report`](crate::ReportSource::fetch_report).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unauthorized: check the configured AVWX API key")]
    Unauthorized,

    /// Non-success status other than the ones mapped above.
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload carried an `error` field.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("failed to parse upstream JSON: {0}")]
    Json(String),

    #[error("API key contains characters that are not valid in an HTTP header")]
    InvalidApiKey,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
