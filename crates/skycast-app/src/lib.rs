//! Controllers the presentation layer drives.
//!
//! Results are exposed as plain state plus [`AppEvent`]s delivered over an
//! mpsc channel, so the UI thread never blocks on the network.

pub mod error_mapping;
pub mod events;
pub mod search;
pub mod weather;

use std::time::Duration;

use skycast_core::{AppError, ConfigError, WeatherConfig};
use skycast_weather::{ClientSettings, WeatherClient};

use crate::error_mapping::IntoAppError;

pub use events::{AppEvent, EventSender, Outcome, CONNECTION_ERROR_MESSAGE};
pub use search::{SearchController, FALLBACK_LOCATION};
pub use weather::{WeatherController, DEFAULT_LOCATION};

/// Build a [`WeatherClient`] from the `[weather]` config section.
///
/// The API key comes from the config file or, failing that, from
/// `OPENWEATHER_API_KEY`.
pub fn client_from_config(config: &WeatherConfig) -> Result<WeatherClient, AppError> {
    let settings = settings_from_config(config, config.effective_api_key())?;
    WeatherClient::new(settings).map_err(IntoAppError::into_app_error)
}

fn settings_from_config(
    config: &WeatherConfig,
    api_key: Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let api_key =
        api_key.ok_or_else(|| ConfigError::MissingSetting("weather.api_key".to_string()))?;

    Ok(ClientSettings {
        base_url: config.api_base_url.clone(),
        icon_base_url: config.icon_base_url.clone(),
        api_key,
        timeout: (config.request_timeout_secs > 0)
            .then(|| Duration::from_secs(config.request_timeout_secs)),
        forecast_count: config.forecast_count,
    })
}
