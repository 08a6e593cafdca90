//! Events sent from the controllers back to the presentation layer.

use std::sync::mpsc::Sender;

/// Message shown for any failed network request.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error, try again later";

/// Channel the presentation layer listens on.
pub type EventSender = Sender<AppEvent>;

/// Notifications for the presentation layer.
///
/// Every `SearchStarted` is followed by exactly one `UpdateList` or
/// `SearchFailed`.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A search request is in flight (show loading indicator)
    SearchStarted,
    /// Display strings for the location list, in API order
    UpdateList(Vec<String>),
    SearchFailed(String),
    /// Current conditions were replaced
    WeatherUpdated,
    WeatherFailed(String),
    /// Forecast was replaced
    ForecastUpdated,
    ForecastFailed(String),
}

impl AppEvent {
    /// True for events that end an in-flight operation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppEvent::SearchStarted)
    }
}

/// How an asynchronous controller operation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
    /// Not issued because the same fetch was already in flight
    Skipped,
}

/// Send an event, ignoring a disconnected receiver.
pub(crate) fn emit(tx: &EventSender, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("Event receiver dropped");
    }
}
