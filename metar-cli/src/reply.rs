//! Reply text for each lookup outcome.

use metar_core::{Outcome, StationId, StationIdError, Unresolved, WeatherReport};

pub const TRY_AGAIN: &str =
    "An error occurred while fetching METAR data. Please try again later.";

/// The message a user sees for `outcome` of a lookup of `requested`.
pub fn render(requested: &StationId, outcome: &Outcome) -> String {
    match outcome {
        Outcome::DirectHit(report) => {
            format!("METAR for **{requested}**:\n```{}```", report.raw)
        }
        Outcome::FallbackHit(hit) => format!(
            "No METAR available for **{requested}**. Closest METAR is at **{}**:\n```{}```",
            hit.station, hit.report.raw
        ),
        Outcome::Unresolvable(Unresolved::NoStationData) => format!(
            "No METAR available for **{requested}**, and location data is unavailable for finding the closest airport."
        ),
        Outcome::Unresolvable(Unresolved::NoNearbyReport) => {
            format!("No METAR data available for **{requested}** or nearby airports.")
        }
        Outcome::Error(_) => TRY_AGAIN.to_string(),
    }
}

pub fn invalid_identifier(input: &str, err: &StationIdError) -> String {
    format!("`{}` is not a valid station identifier ({err}). Try an ICAO code such as KJFK.", input.trim())
}

/// Plain-text summary of whichever decoded fields are present.
pub fn decoded(report: &WeatherReport) -> String {
    let mut out = String::new();

    if let Some(station) = &report.station {
        out.push_str(&format!("Station:      {station}\n"));
    }
    if let Some(at) = report.observed_at {
        out.push_str(&format!("Observed:     {}\n", at.format("%Y-%m-%d %H:%MZ")));
    }
    if let Some(speed) = report.wind_speed {
        let direction = report
            .wind_direction_deg
            .map(|d| format!("{d:03.0}°"))
            .unwrap_or_else(|| "variable".to_string());
        let gust = report.wind_gust.map(|g| format!(" gusting {g}")).unwrap_or_default();
        out.push_str(&format!("Wind:         {direction} at {speed}{gust}\n"));
    }
    if let Some(visibility) = &report.visibility {
        out.push_str(&format!("Visibility:   {visibility}\n"));
    }
    if let Some(temperature) = report.temperature {
        out.push_str(&format!("Temperature:  {temperature}\n"));
    }
    if let Some(dewpoint) = report.dewpoint {
        out.push_str(&format!("Dew point:    {dewpoint}\n"));
    }
    if let Some(altimeter) = report.altimeter {
        out.push_str(&format!("Altimeter:    {altimeter}\n"));
    }
    if !report.clouds.is_empty() {
        out.push_str(&format!("Clouds:       {}\n", report.clouds.join(" ")));
    }
    if let Some(rules) = &report.flight_rules {
        out.push_str(&format!("Flight rules: {rules}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use metar_core::{FallbackHit, FallbackStrategy, FetchError};

    fn id(code: &str) -> StationId {
        StationId::parse(code).unwrap()
    }

    #[test]
    fn direct_hit_quotes_raw_report() {
        let outcome = Outcome::DirectHit(WeatherReport::from_raw("KJFK 191651Z 31012KT"));
        assert_eq!(render(&id("KJFK"), &outcome), "METAR for **KJFK**:\n```KJFK 191651Z 31012KT```");
    }

    #[test]
    fn fallback_hit_names_both_stations() {
        let outcome = Outcome::FallbackHit(FallbackHit {
            station: id("KBBB"),
            report: WeatherReport::from_raw("KBBB 191650Z 27005KT"),
            strategy: FallbackStrategy::Proximity,
        });

        let text = render(&id("KXYZ"), &outcome);
        assert!(text.starts_with("No METAR available for **KXYZ**. Closest METAR is at **KBBB**"));
        assert!(text.ends_with("```KBBB 191650Z 27005KT```"));
    }

    #[test]
    fn unresolvable_reasons_have_distinct_messages() {
        let no_data = render(&id("KXYZ"), &Outcome::Unresolvable(Unresolved::NoStationData));
        let exhausted = render(&id("KXYZ"), &Outcome::Unresolvable(Unresolved::NoNearbyReport));

        assert!(no_data.contains("location data is unavailable"));
        assert!(exhausted.contains("or nearby airports"));
        assert_ne!(no_data, exhausted);
    }

    #[test]
    fn errors_do_not_leak_details() {
        let outcome = Outcome::Error(FetchError::Upstream("secret internals".into()));
        let text = render(&id("KXYZ"), &outcome);

        assert_eq!(text, TRY_AGAIN);
        assert!(!text.contains("secret"));
    }

    #[test]
    fn invalid_identifier_names_input() {
        let err = StationId::parse("K/FK").unwrap_err();
        assert!(invalid_identifier(" K/FK ", &err).starts_with("`K/FK` is not a valid station identifier"));
    }

    #[test]
    fn decoded_lists_only_present_fields() {
        let mut report = WeatherReport::from_raw("KJFK 191651Z VRB03KT");
        report.wind_speed = Some(3.0);
        report.clouds = vec!["FEW030".into(), "BKN250".into()];

        let text = decoded(&report);
        assert!(text.contains("Wind:         variable at 3"));
        assert!(text.contains("Clouds:       FEW030 BKN250"));
        assert!(!text.contains("Temperature"));
    }

    #[test]
    fn decoded_formats_direction_and_gust() {
        let mut report = WeatherReport::from_raw("KJFK 191651Z 09012G20KT");
        report.wind_direction_deg = Some(90.0);
        report.wind_speed = Some(12.0);
        report.wind_gust = Some(20.0);

        assert!(decoded(&report).contains("Wind:         090° at 12 gusting 20"));
    }

    #[test]
    fn decoded_writes_one_line_per_field() {
        let mut report = WeatherReport::from_raw("KJFK 191651Z 31012KT 10SM 12/M03 A3012");
        report.station = Some("KJFK".into());
        report.visibility = Some("10".into());
        report.temperature = Some(12.0);
        report.dewpoint = Some(-3.0);
        report.altimeter = Some(30.12);
        report.flight_rules = Some("VFR".into());

        let text = decoded(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Station:      KJFK",
                "Visibility:   10",
                "Temperature:  12",
                "Dew point:    -3",
                "Altimeter:    30.12",
                "Flight rules: VFR",
            ]
        );
        assert!(text.ends_with('\n'));
        assert_eq!(decoded(&WeatherReport::from_raw("KJFK")), "");
    }
}
