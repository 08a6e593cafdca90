use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format applied to forecast timestamps, e.g. `" Mon Jan 05"`.
pub const FORECAST_DATE_FORMAT: &str = " %a %b %d";

/// A city matched by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    /// ISO 3166 two-letter country code
    pub country: String,
}

impl LocationCandidate {
    /// Display form shown in the location list, e.g. `"London (GB)"`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.country)
    }
}

impl std::fmt::Display for LocationCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.country)
    }
}

/// Current weather conditions, temperatures in degrees Celsius
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: String,
    pub description: String,
    pub icon_id: String,
    pub icon_url: String,
    pub temperature: f64,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

/// One forecast slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub description: String,
    pub icon_id: String,
    pub icon_url: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub timestamp: DateTime<Utc>,
    /// `timestamp` rendered with [`FORECAST_DATE_FORMAT`]
    pub date: String,
}

/// Persisted location preferences.
///
/// `locations` keeps insertion order and never holds duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub current_location: Option<String>,
}

impl StoredPreferences {
    /// Make `location` current, appending it to the list if new.
    ///
    /// Returns true if the location was not already in the list.
    pub fn select(&mut self, location: &str) -> bool {
        let added = if self.contains(location) {
            false
        } else {
            self.locations.push(location.to_string());
            true
        };
        self.current_location = Some(location.to_string());
        added
    }

    pub fn contains(&self, location: &str) -> bool {
        self.locations.iter().any(|l| l == location)
    }
}

/// Errors surfaced by the weather API client
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Decode error: {0}")]
    Decode(String),
}
