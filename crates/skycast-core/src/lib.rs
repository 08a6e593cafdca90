pub mod config;
pub mod error;
pub mod fetch_state;

pub use config::{Config, StorageConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, NetworkError, StorageError};
pub use fetch_state::FetchState;

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("SkyCast core initialized");
    Ok(())
}
