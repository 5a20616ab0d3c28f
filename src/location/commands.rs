use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    location::{FetchOutcome, LocationStatus},
    AppState,
};

/// What the location screen renders: the status, a message for the
/// non-ready states, and whether to offer a retry button.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    pub status: LocationStatus,
    pub message: Option<String>,
    pub can_retry: bool,
}

impl From<LocationStatus> for LocationSnapshot {
    fn from(status: LocationStatus) -> Self {
        let can_retry = status
            .clone()
            .into_fix()
            .is_err_and(|err| err.is_retryable());
        Self {
            message: status.message().map(str::to_string),
            can_retry,
            status,
        }
    }
}

pub async fn get_location_state(state: &AppState) -> Result<LocationSnapshot, String> {
    Ok(LocationSnapshot::from(state.location.status()))
}

/// Also serves as the retry action.
pub async fn request_location(state: &AppState) -> Result<LocationSnapshot, String> {
    Ok(LocationSnapshot::from(state.location.get_location().await))
}

/// `Ok(None)` when the screen went away before the fix arrived.
pub async fn request_location_until(
    state: &AppState,
    interest: CancellationToken,
) -> Result<Option<LocationSnapshot>, String> {
    match state.location.get_location_until(interest).await {
        FetchOutcome::Completed(status) => Ok(Some(LocationSnapshot::from(status))),
        FetchOutcome::Abandoned => Ok(None),
    }
}

pub async fn cancel_location(state: &AppState) -> Result<(), String> {
    state.location.cancel().await;
    Ok(())
}
