//! Core library for the `metar` command.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream weather source abstraction and its AVWX client
//! - Report lookup with nearest-station fallback
//!
//! It is used by `metar-cli`, but any chat or command front end can drive
//! [`MetarService`] and render the returned [`Outcome`] itself.

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod provider;

pub use config::Config;
pub use error::{FetchError, StationIdError};
pub use lookup::MetarService;
pub use model::{
    CandidateList, FallbackHit, FallbackStrategy, Outcome, StationId, StationInfo,
    StationLocation, Unresolved, WeatherReport,
};
pub use provider::{ReportSource, avwx::AvwxSource, source_from_config};
