//! Current conditions and forecast for the chosen location.
//!
//! All network work happens in `refresh_*`; state is guarded by a mutex that
//! is never held across an await point.

use std::sync::Arc;

use parking_lot::Mutex;
use skycast_core::{AppError, FetchState};
use skycast_weather::{
    CurrentConditions, ForecastEntry, LocationStore, StoredPreferences, WeatherClient,
};

use crate::error_mapping::IntoAppError;
use crate::events::{emit, AppEvent, EventSender, Outcome, CONNECTION_ERROR_MESSAGE};

/// Location queried when nothing has been selected.
pub const DEFAULT_LOCATION: &str = "New York US";

#[derive(Debug, Default)]
struct WeatherState {
    active_location: Option<String>,
    prefs: StoredPreferences,
    current: CurrentConditions,
    forecast: Vec<ForecastEntry>,
    current_state: FetchState,
    forecast_state: FetchState,
    /// Bumped by `clear_selection`; refreshes issued under an older
    /// generation drop their result.
    generation: u64,
}

impl WeatherState {
    fn query_location(&self) -> String {
        self.active_location
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
    }
}

/// Coordinates weather fetches for the selected location and keeps the
/// location list persisted.
pub struct WeatherController {
    client: Arc<WeatherClient>,
    store: LocationStore,
    events: EventSender,
    state: Mutex<WeatherState>,
}

impl WeatherController {
    /// Create a controller, loading saved locations from `store`.
    ///
    /// An unreadable store is logged and treated as empty.
    pub fn new(client: Arc<WeatherClient>, store: LocationStore, events: EventSender) -> Self {
        let prefs = match store.load() {
            Ok(Some(prefs)) => {
                tracing::info!("Loaded {} saved locations", prefs.locations.len());
                prefs
            }
            Ok(None) => StoredPreferences::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable location store: {}", e);
                StoredPreferences::default()
            }
        };

        Self {
            client,
            store,
            events,
            state: Mutex::new(WeatherState {
                prefs,
                ..WeatherState::default()
            }),
        }
    }

    /// Show the weather for the last saved location, if there is one.
    pub async fn restore(&self) -> Outcome {
        let saved = {
            let mut state = self.state.lock();
            let saved = state.prefs.current_location.clone();
            if saved.is_some() {
                state.active_location = saved.clone();
            }
            saved
        };

        match saved {
            Some(location) => {
                tracing::info!("Restoring last location: {}", location);
                self.refresh_current().await
            }
            None => Outcome::Skipped,
        }
    }

    /// Make `location` active, persist it and refresh current conditions.
    ///
    /// The location is appended to the saved list only if new; the saved
    /// current location is always updated.
    ///
    /// Nothing changes in memory unless the store write succeeds.
    pub async fn select_location(&self, location: &str) -> Result<Outcome, AppError> {
        let mut prefs = self.state.lock().prefs.clone();
        let added = prefs.select(location);

        self.store
            .save(&prefs)
            .map_err(IntoAppError::into_app_error)?;

        if added {
            tracing::debug!("Added new location: {}", location);
        }
        {
            let mut state = self.state.lock();
            state.prefs = prefs;
            state.active_location = Some(location.to_string());
        }

        Ok(self.refresh_current().await)
    }

    /// Fetch current conditions for the active location.
    ///
    /// Failure keeps the previous record and emits `WeatherFailed`. A result
    /// that lands after `clear_selection` is dropped without an event.
    pub async fn refresh_current(&self) -> Outcome {
        let (location, generation) = {
            let mut state = self.state.lock();
            if !state.current_state.can_start() {
                tracing::debug!("Current conditions already fetching, ignoring refresh");
                return Outcome::Skipped;
            }
            state.current_state = state.current_state.on_start();
            (state.query_location(), state.generation)
        };

        let result = self.client.fetch_current_conditions(&location).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!("Selection cleared, dropping weather for {}", location);
            state.current_state = state.current_state.on_discard();
            return Outcome::Skipped;
        }
        match result {
            Ok(current) => {
                tracing::info!(
                    "Weather for {}: {} {:.1}°C",
                    location,
                    current.description,
                    current.temperature
                );
                state.current = current;
                state.current_state = state.current_state.on_success();
                drop(state);
                emit(&self.events, AppEvent::WeatherUpdated);
                Outcome::Completed
            }
            Err(e) => {
                tracing::warn!("Weather refresh for {} failed: {}", location, e);
                state.current_state = state.current_state.on_failure();
                drop(state);
                emit(
                    &self.events,
                    AppEvent::WeatherFailed(CONNECTION_ERROR_MESSAGE.to_string()),
                );
                Outcome::Failed
            }
        }
    }

    /// Fetch the short forecast for the active location.
    ///
    /// Success replaces the whole forecast; failure leaves it untouched and
    /// emits `ForecastFailed`. Like `refresh_current`, a result that lands
    /// after `clear_selection` is dropped.
    pub async fn refresh_forecast(&self) -> Outcome {
        let (location, generation) = {
            let mut state = self.state.lock();
            if !state.forecast_state.can_start() {
                tracing::debug!("Forecast already fetching, ignoring refresh");
                return Outcome::Skipped;
            }
            state.forecast_state = state.forecast_state.on_start();
            (state.query_location(), state.generation)
        };

        let result = self.client.fetch_forecast(&location).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!("Selection cleared, dropping forecast for {}", location);
            state.forecast_state = state.forecast_state.on_discard();
            return Outcome::Skipped;
        }
        match result {
            Ok(forecast) => {
                tracing::info!("Forecast for {}: {} entries", location, forecast.len());
                state.forecast = forecast;
                state.forecast_state = state.forecast_state.on_success();
                drop(state);
                emit(&self.events, AppEvent::ForecastUpdated);
                Outcome::Completed
            }
            Err(e) => {
                tracing::warn!("Forecast refresh for {} failed: {}", location, e);
                state.forecast_state = state.forecast_state.on_failure();
                drop(state);
                emit(
                    &self.events,
                    AppEvent::ForecastFailed(CONNECTION_ERROR_MESSAGE.to_string()),
                );
                Outcome::Failed
            }
        }
    }

    /// Reset current conditions and forget all saved locations.
    ///
    /// In-flight refreshes finish but their results are discarded. If the
    /// store cannot be written, nothing is reset.
    pub fn clear_selection(&self) -> Result<(), AppError> {
        self.store.clear().map_err(IntoAppError::into_app_error)?;

        {
            let mut state = self.state.lock();
            state.current = CurrentConditions::default();
            state.prefs = StoredPreferences::default();
            state.active_location = None;
            state.generation += 1;
        }

        tracing::info!("Cleared saved locations");
        Ok(())
    }

    pub fn current_conditions(&self) -> CurrentConditions {
        self.state.lock().current.clone()
    }

    pub fn forecast(&self) -> Vec<ForecastEntry> {
        self.state.lock().forecast.clone()
    }

    /// Saved locations in the order they were first chosen.
    pub fn locations(&self) -> Vec<String> {
        self.state.lock().prefs.locations.clone()
    }

    pub fn active_location(&self) -> Option<String> {
        self.state.lock().active_location.clone()
    }

    pub fn current_state(&self) -> FetchState {
        self.state.lock().current_state
    }

    pub fn forecast_state(&self) -> FetchState {
        self.state.lock().forecast_state
    }
}
