use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use metar_core::{Config, MetarService, Outcome, StationId, source_from_config};

use crate::reply;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "metar", version, about = "Latest METAR for an airport, or the closest one that has it")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the AVWX API token.
    Configure,

    /// Show the METAR for a station.
    Show {
        /// ICAO station code, e.g. KJFK.
        icao_code: String,

        /// Also print the decoded fields of the report.
        #[arg(long)]
        decoded: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { icao_code, decoded } => {
                let config = Config::load()?.with_env_overrides();
                let source = source_from_config(&config)?;
                let service = MetarService::from_config(source, &config);

                println!("{}", show(&service, &icao_code, decoded).await);
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("AVWX API token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Create one at https://account.avwx.rest")
        .prompt()
        .context("Failed to read API token")?;

    config.set_api_key(api_key);
    if config.api_key().is_none() {
        anyhow::bail!("API token must not be empty");
    }
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Handle one `metar` command: parse the identifier, look it up, render the reply.
pub async fn show(service: &MetarService, icao_code: &str, decoded: bool) -> String {
    let id = match StationId::parse(icao_code) {
        Ok(id) => id,
        Err(e) => return reply::invalid_identifier(icao_code, &e),
    };

    let outcome = service.get_report(&id).await;
    if let Outcome::Error(e) = &outcome {
        tracing::error!(station = %id, error = %e, "METAR lookup failed");
    }

    let mut text = reply::render(&id, &outcome);
    let summary = outcome.report().filter(|_| decoded).map(reply::decoded).unwrap_or_default();
    if !summary.is_empty() {
        text.push_str("\n\n");
        text.push_str(summary.trim_end());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use metar_core::{FetchError, ReportSource, StationInfo, StationLocation, WeatherReport};
    use std::sync::Arc;

    #[derive(Debug)]
    struct OneStation;

    #[async_trait]
    impl ReportSource for OneStation {
        async fn fetch_report(&self, id: &StationId) -> Result<Option<WeatherReport>, FetchError> {
            if id.as_str() == "KJFK" {
                let mut report = WeatherReport::from_raw("KJFK 191651Z 31012KT");
                report.flight_rules = Some("VFR".into());
                Ok(Some(report))
            } else {
                Ok(None)
            }
        }

        async fn fetch_station(&self, id: &StationId) -> Result<StationInfo, FetchError> {
            Ok(StationInfo::unknown(id.clone()))
        }

        async fn search_nearby(&self, _location: StationLocation) -> Result<Vec<StationId>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn service() -> MetarService {
        MetarService::new(Arc::new(OneStation))
    }

    #[tokio::test]
    async fn show_normalizes_input_and_renders_hit() {
        let text = show(&service(), "kjfk", false).await;
        assert_eq!(text, "METAR for **KJFK**:\n```KJFK 191651Z 31012KT```");
    }

    #[tokio::test]
    async fn show_appends_decoded_fields_on_request() {
        let text = show(&service(), "KJFK", true).await;
        assert!(text.ends_with("Flight rules: VFR"));
    }

    #[tokio::test]
    async fn show_reports_invalid_identifier_without_lookup() {
        let text = show(&service(), "   ", false).await;
        assert!(text.contains("is not a valid station identifier"));
    }

    #[tokio::test]
    async fn show_reports_unresolvable_station() {
        let text = show(&service(), "KXYZ", true).await;
        assert!(text.contains("location data is unavailable"));
    }

    #[test]
    fn parses_show_command() {
        let cli = Cli::try_parse_from(["metar", "show", "egll", "--decoded"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show { ref icao_code, decoded: true } if icao_code == "egll"
        ));
    }
}
