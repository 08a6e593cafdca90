//! Fetch state machine for weather refreshes.
//!
//! `Idle -> Fetching -> {Ready, Failed}`; both terminal states go back to
//! `Fetching` on the next refresh. Only one fetch per slot runs at a time.

/// State of a single refresh slot (current conditions or forecast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
    Ready,
    Failed,
}

impl FetchState {
    /// True if a new fetch can be started.
    pub fn can_start(self) -> bool {
        !matches!(self, FetchState::Fetching)
    }

    /// State after a fetch is issued. Ignored while already fetching.
    pub fn on_start(self) -> Self {
        FetchState::Fetching
    }

    /// State after the in-flight fetch succeeded.
    pub fn on_success(self) -> Self {
        FetchState::Ready
    }

    /// State after the in-flight fetch failed.
    pub fn on_failure(self) -> Self {
        FetchState::Failed
    }

    /// State after the in-flight result was dropped because the selection
    /// it was issued for no longer exists.
    pub fn on_discard(self) -> Self {
        FetchState::Idle
    }
}
