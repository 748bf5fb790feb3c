use serde::{Deserialize, Serialize};

use crate::ExportError;

pub const CSV_FILE_NAME: &str = "ipo_simulation.csv";
pub const CSV_MIME: &str = "text/csv";
pub const PRICE_COLUMN: &str = "Final Price";

#[derive(Debug, Serialize, Deserialize)]
struct PriceRow {
    #[serde(rename = "Final Price")]
    final_price: f64,
}

/// Serialize sampled prices as a one-column UTF-8 CSV with a `Final Price` header.
///
/// Floats use shortest round-trip formatting, so parsing the file back
/// yields the exact same values.
pub fn simulation_csv(prices: &[f64]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::with_capacity(prices.len() * 8 + 16));
    if prices.is_empty() {
        writer.write_record([PRICE_COLUMN])?;
    }
    for &final_price in prices {
        writer.serialize(PriceRow { final_price })?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Format(e.to_string()))
}

/// Read a file produced by [`simulation_csv`] back into prices.
pub fn parse_simulation_csv(data: &[u8]) -> Result<Vec<f64>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    if headers.len() != 1 || headers.get(0) != Some(PRICE_COLUMN) {
        return Err(ExportError::Format(format!(
            "expected a single '{}' column, found {:?}",
            PRICE_COLUMN,
            headers.iter().collect::<Vec<_>>()
        )));
    }

    reader
        .deserialize::<PriceRow>()
        .map(|row| row.map(|r| r.final_price).map_err(ExportError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::{CompetitionImpact, ScenarioPrices, ScenarioSet};
    use ipo_simulator::simulate_seeded;

    #[test]
    fn test_header_and_rows() {
        let bytes = simulation_csv(&[50.0, 76.5, 120.0]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Final Price");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "76.5");
    }

    #[test]
    fn test_round_trip_matches_simulation() {
        let set = ScenarioSet::from_two(0.2, 0.5, ScenarioPrices::default()).unwrap();
        let sim = simulate_seeded(&set, CompetitionImpact::Moderate, 5000, 99).unwrap();

        let bytes = simulation_csv(&sim.prices).unwrap();
        let parsed = parse_simulation_csv(&bytes).unwrap();

        assert_eq!(parsed.len(), 5000);
        assert_eq!(parsed, sim.prices);
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let bytes = simulation_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().trim_end(), "Final Price");
        assert!(parse_simulation_csv(b"Final Price\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_other_columns() {
        let err = parse_simulation_csv(b"Price,Scenario\n50,Bear\n").unwrap_err();
        assert!(matches!(err, ExportError::Format(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric_rows() {
        assert!(parse_simulation_csv(b"Final Price\nabc\n").is_err());
    }
}
