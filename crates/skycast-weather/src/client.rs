//! OpenWeatherMap API client.
//!
//! Builds request URLs for city search, current conditions and forecast,
//! and reshapes the JSON responses into domain records.

use std::time::Duration;

use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::location::normalize_location;
use crate::types::{
    CurrentConditions, ForecastEntry, LocationCandidate, NetworkError, FORECAST_DATE_FORMAT,
};

pub const DEFAULT_API_BASE_URL: &str = "http://api.openweathermap.org/data/2.5";
pub const DEFAULT_ICON_BASE_URL: &str = "http://openweathermap.org/img/w";
const DEFAULT_FORECAST_COUNT: u8 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connection settings for [`WeatherClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub icon_base_url: String,
    pub api_key: String,
    /// `None` leaves the timeout to the transport
    pub timeout: Option<Duration>,
    pub forecast_count: u8,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
            forecast_count: DEFAULT_FORECAST_COUNT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    list: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiCity {
    name: String,
    sys: ApiSys,
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct ApiWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    temp_max: f64,
    temp_min: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCurrentResponse {
    weather: Vec<ApiWeather>,
    main: ApiMain,
}

#[derive(Debug, Deserialize)]
struct ApiForecastResponse {
    list: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastItem {
    dt: i64,
    weather: Vec<ApiWeather>,
    main: ApiTempRange,
}

#[derive(Debug, Deserialize)]
struct ApiTempRange {
    temp_max: f64,
    temp_min: f64,
}

/// Read-only client for the OpenWeatherMap data API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    settings: ClientSettings,
}

impl WeatherClient {
    pub fn new(settings: ClientSettings) -> Result<Self, NetworkError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let settings = ClientSettings {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            icon_base_url: settings.icon_base_url.trim_end_matches('/').to_string(),
            ..settings
        };

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Image URL for an OpenWeatherMap icon id such as `"01d"`.
    pub fn icon_url(&self, icon_id: &str) -> String {
        icon_url(&self.settings.icon_base_url, icon_id)
    }

    /// Search cities whose name matches `query`.
    ///
    /// The query is inserted into the URL as typed. Elements without a name
    /// or country code are skipped. An empty result is returned as-is.
    #[instrument(skip(self), level = "info")]
    pub async fn search_locations(
        &self,
        query: &str,
    ) -> Result<Vec<LocationCandidate>, NetworkError> {
        let url = format!(
            "{}/find?q={}&type=like&appid={}",
            self.settings.base_url, query, self.settings.api_key
        );

        let body = self.get_body(&url).await?;
        let candidates = parse_candidates(&body)?;
        tracing::debug!("Search '{}' matched {} candidates", query, candidates.len());
        Ok(candidates)
    }

    /// Current conditions for a display location such as `"Tokyo (JP)"`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current_conditions(
        &self,
        location: &str,
    ) -> Result<CurrentConditions, NetworkError> {
        let url = format!(
            "{}/weather?q={}&units=metric&appid={}",
            self.settings.base_url,
            normalize_location(location),
            self.settings.api_key
        );

        let body = self.get_body(&url).await?;
        parse_current(&body, location, &self.settings.icon_base_url)
    }

    /// Short forecast for a display location.
    ///
    /// Malformed entries are skipped; the rest keep their API order.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, location: &str) -> Result<Vec<ForecastEntry>, NetworkError> {
        let url = format!(
            "{}/forecast?q={}&units=metric&cnt={}&appid={}",
            self.settings.base_url,
            normalize_location(location),
            self.settings.forecast_count,
            self.settings.api_key
        );

        let body = self.get_body(&url).await?;
        parse_forecast(&body, &self.settings.icon_base_url)
    }

    async fn get_body(&self, url: &str) -> Result<String, NetworkError> {
        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API returned status {}", status);
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(transport)
    }
}

/// Request URLs carry the API key, so they are stripped before the error
/// can reach a log line or a caller.
fn transport(e: reqwest::Error) -> NetworkError {
    NetworkError::Transport(e.without_url())
}

fn icon_url(icon_base_url: &str, icon_id: &str) -> String {
    format!("{}/{}.png", icon_base_url, icon_id)
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, NetworkError> {
    serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))
}

fn parse_candidates(body: &str) -> Result<Vec<LocationCandidate>, NetworkError> {
    let response: FindResponse = decode(body)?;

    let candidates = response
        .list
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<ApiCity>(item) {
            Ok(city) => Some(LocationCandidate {
                name: city.name,
                country: city.sys.country,
            }),
            Err(e) => {
                tracing::warn!("Skipping malformed search result {}: {}", i, e);
                None
            }
        })
        .collect();

    Ok(candidates)
}

fn parse_current(
    body: &str,
    location: &str,
    icon_base_url: &str,
) -> Result<CurrentConditions, NetworkError> {
    let response: ApiCurrentResponse = decode(body)?;
    let weather = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| NetworkError::Decode("response has no weather entry".to_string()))?;

    Ok(CurrentConditions {
        location: location.to_string(),
        icon_url: icon_url(icon_base_url, &weather.icon),
        description: weather.description,
        icon_id: weather.icon,
        temperature: response.main.temp,
        temperature_max: response.main.temp_max,
        temperature_min: response.main.temp_min,
    })
}

fn parse_forecast(body: &str, icon_base_url: &str) -> Result<Vec<ForecastEntry>, NetworkError> {
    let response: ApiForecastResponse = decode(body)?;

    let entries = response
        .list
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match forecast_entry(item, icon_base_url) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                tracing::warn!("Skipping malformed forecast entry {}: {}", i, reason);
                None
            }
        })
        .collect();

    Ok(entries)
}

fn forecast_entry(item: serde_json::Value, icon_base_url: &str) -> Result<ForecastEntry, String> {
    let item: ApiForecastItem = serde_json::from_value(item).map_err(|e| e.to_string())?;
    let weather = item
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| "no weather entry".to_string())?;
    let timestamp = DateTime::from_timestamp(item.dt, 0)
        .ok_or_else(|| format!("invalid timestamp {}", item.dt))?;

    Ok(ForecastEntry {
        icon_url: icon_url(icon_base_url, &weather.icon),
        description: weather.description,
        icon_id: weather.icon,
        temperature_max: item.main.temp_max,
        temperature_min: item.main.temp_min,
        date: timestamp.format(FORECAST_DATE_FORMAT).to_string(),
        timestamp,
    })
}
