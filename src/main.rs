use std::sync::mpsc;
use std::sync::Arc;

use anyhow::Result;
use skycast_app::{client_from_config, AppEvent, Outcome, WeatherController};
use skycast_weather::LocationStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    skycast_core::init()?;

    let (config, _warnings) = skycast_core::Config::load_validated()?;
    tracing::info!("SkyCast started, config dir {}", config.config_dir.display());

    let client = match client_from_config(&config.weather) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    let (tx, rx) = mpsc::channel();
    let store = LocationStore::open(config.store_path());
    let weather = WeatherController::new(client, store, tx);

    println!("SkyCast - weather lookup");
    println!("  Saved locations: {}", weather.locations().join(", "));

    if weather.restore().await == Outcome::Completed {
        weather.refresh_forecast().await;
    }

    for event in rx.try_iter() {
        match event {
            AppEvent::WeatherUpdated => {
                let current = weather.current_conditions();
                println!(
                    "\n{}: {} {:.1}°C (max {:.1}°C, min {:.1}°C)",
                    current.location,
                    current.description,
                    current.temperature,
                    current.temperature_max,
                    current.temperature_min
                );
            }
            AppEvent::ForecastUpdated => {
                for entry in weather.forecast() {
                    println!(
                        "  {} {} {:.1}°C / {:.1}°C",
                        entry.date, entry.description, entry.temperature_max, entry.temperature_min
                    );
                }
            }
            AppEvent::WeatherFailed(msg) | AppEvent::ForecastFailed(msg) => {
                eprintln!("{}", msg);
            }
            _ => {}
        }
    }

    Ok(())
}
