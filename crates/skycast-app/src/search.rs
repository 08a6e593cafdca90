//! Location search: raw query in, display list out.

use std::sync::Arc;

use parking_lot::Mutex;
use skycast_weather::{LocationCandidate, WeatherClient};

use crate::events::{emit, AppEvent, EventSender, Outcome, CONNECTION_ERROR_MESSAGE};

/// Shown when a search matches nothing.
pub const FALLBACK_LOCATION: &str = "New York US";

/// Turns a typed query into the list of locations to display.
pub struct SearchController {
    client: Arc<WeatherClient>,
    events: EventSender,
    results: Mutex<Vec<String>>,
}

impl SearchController {
    pub fn new(client: Arc<WeatherClient>, events: EventSender) -> Self {
        Self {
            client,
            events,
            results: Mutex::new(Vec::new()),
        }
    }

    /// Run a search and publish the outcome.
    ///
    /// Emits `SearchStarted` followed by exactly one of `UpdateList` or
    /// `SearchFailed`. A blank query is not sent and emits nothing.
    pub async fn search(&self, query: &str) -> Outcome {
        if query.trim().is_empty() {
            tracing::debug!("Ignoring empty search query");
            return Outcome::Skipped;
        }

        emit(&self.events, AppEvent::SearchStarted);

        match self.client.search_locations(query).await {
            Ok(candidates) => {
                let list = display_list(&candidates);
                tracing::info!("Search '{}' produced {} entries", query, list.len());
                *self.results.lock() = list.clone();
                emit(&self.events, AppEvent::UpdateList(list));
                Outcome::Completed
            }
            Err(e) => {
                tracing::warn!("Search '{}' failed: {}", query, e);
                emit(
                    &self.events,
                    AppEvent::SearchFailed(CONNECTION_ERROR_MESSAGE.to_string()),
                );
                Outcome::Failed
            }
        }
    }

    /// Entries from the last successful search.
    pub fn results(&self) -> Vec<String> {
        self.results.lock().clone()
    }
}

/// Display strings in API order, never empty.
pub fn display_list(candidates: &[LocationCandidate]) -> Vec<String> {
    if candidates.is_empty() {
        return vec![FALLBACK_LOCATION.to_string()];
    }
    candidates.iter().map(LocationCandidate::display_name).collect()
}
