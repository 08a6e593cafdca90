//! Integration tests for the search and weather controllers.
//!
//! The OpenWeatherMap API is served by wiremock and the location store lives
//! in a temporary directory.

use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

use skycast_app::{AppEvent, Outcome, SearchController, WeatherController, CONNECTION_ERROR_MESSAGE};
use skycast_core::{AppError, FetchState, StorageError};
use skycast_weather::{ClientSettings, LocationStore, WeatherClient};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Arc<WeatherClient> {
    Arc::new(
        WeatherClient::new(ClientSettings {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout: Some(Duration::from_millis(500)),
            ..ClientSettings::default()
        })
        .unwrap(),
    )
}

fn weather_controller(
    server: &MockServer,
    dir: &TempDir,
) -> (WeatherController, Receiver<AppEvent>) {
    let (tx, rx) = channel();
    let store = LocationStore::open(dir.path().join("weather_store.json"));
    (WeatherController::new(client_for(server), store, tx), rx)
}

fn drain(rx: &Receiver<AppEvent>) -> Vec<AppEvent> {
    rx.try_iter().collect()
}

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "main": { "temp": 20.1, "feels_like": 19.0, "temp_max": 22.0, "temp_min": 18.5 },
        "name": "Tokyo"
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "cnt": 2,
        "list": [
            {
                "dt": 1609804800,
                "main": { "temp": 8.0, "temp_max": 9.0, "temp_min": 6.0 },
                "weather": [{ "description": "light rain", "icon": "10d" }]
            },
            {
                "dt": 1609891200,
                "main": { "temp": 7.0, "temp_max": 8.0, "temp_min": 5.0 },
                "weather": [{ "description": "overcast clouds", "icon": "04d" }]
            }
        ]
    })
}

#[tokio::test]
async fn test_search_lists_candidates_in_api_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/find"))
        .and(query_param("q", "Londo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 2,
            "list": [
                { "name": "London", "sys": { "country": "GB" } },
                { "name": "London", "sys": { "country": "CA" } }
            ]
        })))
        .mount(&mock_server)
        .await;

    let (tx, rx) = channel();
    let controller = SearchController::new(client_for(&mock_server), tx);

    assert_eq!(controller.search("Londo").await, Outcome::Completed);

    let expected = vec!["London (GB)".to_string(), "London (CA)".to_string()];
    assert_eq!(
        drain(&rx),
        vec![AppEvent::SearchStarted, AppEvent::UpdateList(expected.clone())]
    );
    assert_eq!(controller.results(), expected);
}

#[tokio::test]
async fn test_search_without_matches_uses_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 0,
            "list": []
        })))
        .mount(&mock_server)
        .await;

    let (tx, rx) = channel();
    let controller = SearchController::new(client_for(&mock_server), tx);
    controller.search("qwertyuiop").await;

    assert_eq!(
        drain(&rx),
        vec![
            AppEvent::SearchStarted,
            AppEvent::UpdateList(vec!["New York US".to_string()])
        ]
    );
}

#[tokio::test]
async fn test_search_failure_emits_single_terminal_event() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/find"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (tx, rx) = channel();
    let controller = SearchController::new(client_for(&mock_server), tx);

    assert_eq!(controller.search("Paris").await, Outcome::Failed);
    assert_eq!(
        drain(&rx),
        vec![
            AppEvent::SearchStarted,
            AppEvent::SearchFailed(CONNECTION_ERROR_MESSAGE.to_string())
        ]
    );
    assert!(controller.results().is_empty());
}

#[tokio::test]
async fn test_blank_search_is_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/find"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (tx, rx) = channel();
    let controller = SearchController::new(client_for(&mock_server), tx);

    assert_eq!(controller.search("   ").await, Outcome::Skipped);
    assert!(drain(&rx).is_empty());
}

#[tokio::test]
async fn test_select_location_fetches_current_conditions_once() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Tokyo,JP"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (controller, rx) = weather_controller(&mock_server, &dir);
    let outcome = controller.select_location("Tokyo (JP)").await.unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let current = controller.current_conditions();
    assert_eq!(current.location, "Tokyo (JP)");
    assert_eq!(current.description, "clear sky");
    assert_eq!(current.icon_id, "01d");
    assert_eq!(current.temperature, 20.1);
    assert_eq!(current.temperature_max, 22.0);
    assert_eq!(current.temperature_min, 18.5);

    assert_eq!(controller.current_state(), FetchState::Ready);
    assert_eq!(drain(&rx), vec![AppEvent::WeatherUpdated]);
}

#[tokio::test]
async fn test_select_location_is_idempotent_for_saved_list() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&mock_server)
        .await;

    let (controller, _rx) = weather_controller(&mock_server, &dir);
    controller.select_location("Paris (FR)").await.unwrap();
    controller.select_location("Tokyo (JP)").await.unwrap();
    controller.select_location("Paris (FR)").await.unwrap();
    controller.select_location("Paris (FR)").await.unwrap();

    assert_eq!(controller.locations(), vec!["Paris (FR)", "Tokyo (JP)"]);
    assert_eq!(controller.active_location().as_deref(), Some("Paris (FR)"));

    let store = LocationStore::open(dir.path().join("weather_store.json"));
    let prefs = store.load().unwrap().unwrap();
    assert_eq!(prefs.locations, vec!["Paris (FR)", "Tokyo (JP)"]);
    assert_eq!(prefs.current_location.as_deref(), Some("Paris (FR)"));
}

#[tokio::test]
async fn test_clear_selection_resets_conditions_and_store() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&mock_server)
        .await;

    let (controller, _rx) = weather_controller(&mock_server, &dir);
    controller.select_location("Tokyo (JP)").await.unwrap();
    assert_eq!(controller.current_conditions().description, "clear sky");

    controller.clear_selection().unwrap();

    let current = controller.current_conditions();
    assert_eq!(current.description, "");
    assert_eq!(current.icon_url, "");
    assert_eq!(current.temperature, 0.0);
    assert!(controller.locations().is_empty());
    assert!(controller.active_location().is_none());

    let store = LocationStore::open(dir.path().join("weather_store.json"));
    let prefs = store.load().unwrap().unwrap_or_default();
    assert!(prefs.locations.is_empty());
    assert!(prefs.current_location.is_none());
}

#[tokio::test]
async fn test_forecast_failure_keeps_previous_forecast() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("cnt", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    // Second request outlives the client timeout
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let (controller, rx) = weather_controller(&mock_server, &dir);

    assert_eq!(controller.refresh_forecast().await, Outcome::Completed);
    let before = controller.forecast();
    assert_eq!(before.len(), 2);
    assert_eq!(before[0].date, " Tue Jan 05");
    assert_eq!(drain(&rx), vec![AppEvent::ForecastUpdated]);

    assert_eq!(controller.refresh_forecast().await, Outcome::Failed);
    assert_eq!(controller.forecast(), before);
    assert_eq!(controller.forecast_state(), FetchState::Failed);
    assert_eq!(
        drain(&rx),
        vec![AppEvent::ForecastFailed(CONNECTION_ERROR_MESSAGE.to_string())]
    );
}

#[tokio::test]
async fn test_weather_failure_keeps_previous_conditions() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (controller, rx) = weather_controller(&mock_server, &dir);
    controller.select_location("Tokyo (JP)").await.unwrap();
    let before = controller.current_conditions();
    drain(&rx);

    assert_eq!(controller.refresh_current().await, Outcome::Failed);
    assert_eq!(controller.current_conditions(), before);
    assert_eq!(
        drain(&rx),
        vec![AppEvent::WeatherFailed(CONNECTION_ERROR_MESSAGE.to_string())]
    );
}

#[tokio::test]
async fn test_refresh_while_fetching_is_ignored() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (controller, rx) = weather_controller(&mock_server, &dir);

    let (first, second) =
        tokio::join!(controller.refresh_forecast(), controller.refresh_forecast());
    assert_eq!(first, Outcome::Completed);
    assert_eq!(second, Outcome::Skipped);
    assert_eq!(drain(&rx), vec![AppEvent::ForecastUpdated]);
}

#[tokio::test]
async fn test_unselected_controller_queries_default_location() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "New,York,US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (controller, _rx) = weather_controller(&mock_server, &dir);
    assert_eq!(controller.refresh_current().await, Outcome::Completed);
    assert_eq!(controller.current_conditions().location, "New York US");
}

#[tokio::test]
async fn test_restore_uses_saved_location() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Oslo,NO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    LocationStore::open(dir.path().join("weather_store.json"))
        .save_parts(
            &["Paris (FR)".to_string(), "Oslo (NO)".to_string()],
            Some("Oslo (NO)"),
        )
        .unwrap();

    let (controller, rx) = weather_controller(&mock_server, &dir);
    assert_eq!(controller.locations(), vec!["Paris (FR)", "Oslo (NO)"]);

    assert_eq!(controller.restore().await, Outcome::Completed);
    assert_eq!(controller.active_location().as_deref(), Some("Oslo (NO)"));
    assert_eq!(drain(&rx), vec![AppEvent::WeatherUpdated]);
}

#[tokio::test]
async fn test_restore_without_saved_location_does_nothing() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let (controller, rx) = weather_controller(&mock_server, &dir);
    assert_eq!(controller.restore().await, Outcome::Skipped);
    assert!(drain(&rx).is_empty());
    assert_eq!(controller.current_state(), FetchState::Idle);
}

#[tokio::test]
async fn test_failed_save_leaves_selection_unchanged() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    // A directory cannot be written as the store file
    let (tx, rx) = channel();
    let store = LocationStore::open(dir.path());
    let controller = WeatherController::new(client_for(&mock_server), store, tx);

    let err = controller.select_location("Tokyo (JP)").await.unwrap_err();
    assert!(matches!(err, AppError::Storage(StorageError::WriteFailed(_))));

    assert!(controller.active_location().is_none());
    assert!(controller.locations().is_empty());
    assert_eq!(controller.current_state(), FetchState::Idle);
    assert!(drain(&rx).is_empty());
}

#[tokio::test]
async fn test_failed_clear_keeps_selection() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&mock_server)
        .await;

    let (controller, _rx) = weather_controller(&mock_server, &dir);
    controller.select_location("Tokyo (JP)").await.unwrap();

    let store_path = dir.path().join("weather_store.json");
    std::fs::remove_file(&store_path).unwrap();
    std::fs::create_dir(&store_path).unwrap();

    let err = controller.clear_selection().unwrap_err();
    assert!(matches!(err, AppError::Storage(StorageError::WriteFailed(_))));

    assert_eq!(controller.locations(), vec!["Tokyo (JP)"]);
    assert_eq!(controller.active_location().as_deref(), Some("Tokyo (JP)"));
    assert_eq!(controller.current_conditions().description, "clear sky");
}

#[tokio::test]
async fn test_clear_during_refresh_drops_late_results() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let (controller, rx) = weather_controller(&mock_server, &dir);

    let (current, forecast, cleared) = tokio::join!(
        controller.refresh_current(),
        controller.refresh_forecast(),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.clear_selection()
        }
    );
    cleared.unwrap();

    assert_eq!(current, Outcome::Skipped);
    assert_eq!(forecast, Outcome::Skipped);
    assert_eq!(controller.current_conditions().description, "");
    assert!(controller.forecast().is_empty());
    assert_eq!(controller.current_state(), FetchState::Idle);
    assert_eq!(controller.forecast_state(), FetchState::Idle);
    assert!(drain(&rx).is_empty());

    // The next refresh after the clear is applied normally
    assert_eq!(controller.refresh_forecast().await, Outcome::Completed);
    assert_eq!(controller.forecast().len(), 2);
}
