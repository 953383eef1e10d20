// 📍 Location Rates - Base price per sqft by locality
// Immutable lookup table handed to the estimator at construction

use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Rate applied to any location missing from the table
pub const DEFAULT_BASE_RATE: f64 = 6000.0;

/// Built-in Bangalore localities, in the order the location picker shows them
const BANGALORE_RATES: [(&str, f64); 10] = [
    ("Whitefield", 6500.0),
    ("Sarjapur Road", 6200.0),
    ("Electronic City", 5800.0),
    ("Marathahalli", 6300.0),
    ("Bellandur", 6700.0),
    ("Koramangala", 8500.0),
    ("Indiranagar", 9000.0),
    ("HSR Layout", 7500.0),
    ("JP Nagar", 7200.0),
    ("Yelahanka", 5500.0),
];

/// Sample location list used when the location collaborator is unreachable
pub fn sample_locations() -> Vec<String> {
    BANGALORE_RATES
        .iter()
        .map(|(name, _)| name.to_string())
        .collect()
}

// ============================================================================
// RATE TABLE
// ============================================================================

/// Location name → base rate (currency units per sqft).
///
/// Lookups are case-sensitive. The table has no mutators: build it once
/// and share it by reference or `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRateTable {
    #[serde(default = "default_rate")]
    default_rate: f64,

    rates: HashMap<String, f64>,
}

fn default_rate() -> f64 {
    DEFAULT_BASE_RATE
}

#[derive(Debug, Deserialize)]
struct RateRow {
    location: String,
    rate: f64,
}

impl LocationRateTable {
    /// Create a table from explicit entries
    pub fn new<I, S>(entries: I, default_rate: f64) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        LocationRateTable {
            default_rate,
            rates: entries
                .into_iter()
                .map(|(name, rate)| (name.into(), rate))
                .collect(),
        }
    }

    /// The ten Bangalore localities with a 6000/sqft fallback
    pub fn bangalore() -> Self {
        Self::new(BANGALORE_RATES, DEFAULT_BASE_RATE)
    }

    /// Load from JSON: `{"default_rate": 6000, "rates": {"Whitefield": 6500}}`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rate table: {:?}", path.as_ref()))?;

        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let table: LocationRateTable =
            serde_json::from_str(content).context("Failed to parse rate table JSON")?;
        table.check()?;
        Ok(table)
    }

    /// Load from CSV with a `location,rate` header; default rate stays 6000
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path.as_ref())
            .with_context(|| format!("Failed to open rate table CSV: {:?}", path.as_ref()))?;

        let mut rates = HashMap::new();
        for result in rdr.deserialize() {
            let row: RateRow = result.context("Failed to deserialize rate row")?;
            rates.insert(row.location, row.rate);
        }

        let table = LocationRateTable {
            default_rate: DEFAULT_BASE_RATE,
            rates,
        };
        table.check()?;
        Ok(table)
    }

    /// Pick a loader by file extension (`.json` or `.csv`)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some("csv") => Self::from_csv_file(path),
            other => bail!("Unsupported rate table format {:?}: {:?}", other, path),
        }
    }

    fn check(&self) -> Result<()> {
        if !self.default_rate.is_finite() || self.default_rate < 0.0 {
            bail!("Default rate must be a non-negative number, got {}", self.default_rate);
        }
        for (location, rate) in &self.rates {
            if location.is_empty() {
                bail!("Rate table contains an empty location name");
            }
            if !rate.is_finite() || *rate < 0.0 {
                bail!("Rate for {} must be a non-negative number, got {}", location, rate);
            }
        }
        Ok(())
    }

    /// Base rate for a location, or the default rate when unknown
    pub fn rate_for(&self, location: &str) -> f64 {
        self.rates.get(location).copied().unwrap_or(self.default_rate)
    }

    /// Rate only if the location is listed
    pub fn get(&self, location: &str) -> Option<f64> {
        self.rates.get(location).copied()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.rates.contains_key(location)
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    /// All listed locations, sorted alphabetically
    pub fn location_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for LocationRateTable {
    fn default() -> Self {
        Self::bangalore()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bangalore_table() {
        let table = LocationRateTable::bangalore();

        assert_eq!(table.len(), 10);
        assert_eq!(table.rate_for("Koramangala"), 8500.0);
        assert_eq!(table.rate_for("Indiranagar"), 9000.0);
        assert_eq!(table.rate_for("Yelahanka"), 5500.0);
        assert_eq!(table.default_rate(), 6000.0);
    }

    #[test]
    fn test_unknown_location_uses_default() {
        let table = LocationRateTable::bangalore();

        assert_eq!(table.rate_for("Nowhere"), DEFAULT_BASE_RATE);
        assert_eq!(table.get("Nowhere"), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = LocationRateTable::bangalore();

        assert!(table.contains("Whitefield"));
        assert!(!table.contains("whitefield"));
        assert_eq!(table.rate_for("whitefield"), DEFAULT_BASE_RATE);
    }

    #[test]
    fn test_location_names_sorted() {
        let names = LocationRateTable::bangalore().location_names();

        assert_eq!(names.first().map(String::as_str), Some("Bellandur"));
        assert_eq!(names.last().map(String::as_str), Some("Yelahanka"));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_sample_locations_keep_picker_order() {
        let samples = sample_locations();

        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0], "Whitefield");
        assert_eq!(samples[9], "Yelahanka");
    }

    #[test]
    fn test_from_json_str() {
        let table = LocationRateTable::from_json_str(
            r#"{"default_rate": 5000, "rates": {"Hebbal": 7000}}"#,
        )
        .unwrap();

        assert_eq!(table.rate_for("Hebbal"), 7000.0);
        assert_eq!(table.rate_for("Whitefield"), 5000.0);
    }

    #[test]
    fn test_from_json_default_rate_optional() {
        let table = LocationRateTable::from_json_str(r#"{"rates": {"Hebbal": 7000}}"#).unwrap();
        assert_eq!(table.default_rate(), DEFAULT_BASE_RATE);
    }

    #[test]
    fn test_rejects_negative_rate() {
        let result = LocationRateTable::from_json_str(r#"{"rates": {"Hebbal": -1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "location,rate").unwrap();
        writeln!(file, "Hebbal,7100").unwrap();
        writeln!(file, "Banashankari,6400").unwrap();
        file.flush().unwrap();

        let table = LocationRateTable::from_path(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rate_for("Banashankari"), 6400.0);
        assert_eq!(table.rate_for("Koramangala"), DEFAULT_BASE_RATE);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(LocationRateTable::from_path("rates.yaml").is_err());
    }
}
