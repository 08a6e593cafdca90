//! Weather service for SkyCast
//!
//! Provides city search and weather data via the OpenWeatherMap API,
//! plus persistence of the user's chosen locations.

pub mod client;
pub mod location;
pub mod store;
pub mod types;

pub use client::{ClientSettings, WeatherClient};
pub use location::normalize_location;
pub use store::{LocationStore, StoreError};
pub use types::*;
