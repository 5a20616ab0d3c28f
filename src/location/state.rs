use serde::{Deserialize, Serialize};

use crate::{
    config::LocationSettings,
    error::{AppError, AppResult},
    models::LocationFix,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Failure codes reported by the platform location API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FixErrorCode {
    PermissionDenied,
    Unavailable,
    Timeout,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl LocationFailure {
    pub fn new(kind: FailureKind) -> Self {
        let message = match kind {
            FailureKind::PermissionDenied => "Location permission denied",
            FailureKind::PositionUnavailable => "Position unavailable",
            FailureKind::Timeout => "Location request timed out",
            FailureKind::Unknown => "Unable to get your position",
        };
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl From<FixErrorCode> for LocationFailure {
    fn from(code: FixErrorCode) -> Self {
        let kind = match code {
            FixErrorCode::PermissionDenied => FailureKind::PermissionDenied,
            FixErrorCode::Unavailable => FailureKind::PositionUnavailable,
            FixErrorCode::Timeout => FailureKind::Timeout,
            FixErrorCode::Unknown => FailureKind::Unknown,
        };
        LocationFailure::new(kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", tag = "state", content = "detail")]
pub enum LocationStatus {
    #[default]
    Idle,
    PermissionPending,
    Fetching,
    Ready(LocationFix),
    Denied,
    Failed(LocationFailure),
}

impl LocationStatus {
    /// True once nothing is pending: a waiter can stop listening.
    pub fn is_settled(&self) -> bool {
        !matches!(
            self,
            LocationStatus::PermissionPending | LocationStatus::Fetching
        )
    }

    pub fn fix(&self) -> Option<LocationFix> {
        match self {
            LocationStatus::Ready(fix) => Some(*fix),
            _ => None,
        }
    }

    /// Message a screen shows for a non-ready state, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            LocationStatus::Denied => Some("Location permission is required to show the map"),
            LocationStatus::Failed(failure) => Some(&failure.message),
            _ => None,
        }
    }

    pub fn into_fix(self) -> AppResult<LocationFix> {
        match self {
            LocationStatus::Ready(fix) => Ok(fix),
            LocationStatus::Denied => Err(AppError::PermissionDenied(
                "Location permission denied".into(),
            )),
            LocationStatus::Failed(failure) => Err(match failure.kind {
                FailureKind::PermissionDenied => AppError::PermissionDenied(failure.message),
                FailureKind::Timeout => AppError::LocationTimeout(failure.message),
                FailureKind::PositionUnavailable | FailureKind::Unknown => {
                    AppError::LocationUnavailable(failure.message)
                }
            }),
            LocationStatus::Idle
            | LocationStatus::PermissionPending
            | LocationStatus::Fetching => Err(AppError::NoLocationFix),
        }
    }
}

/// Options handed to the platform for a single fix request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// Oldest cached fix the platform may return instead of a fresh read.
    pub max_cached_age_ms: u64,
}

impl From<&LocationSettings> for FixOptions {
    fn from(settings: &LocationSettings) -> Self {
        Self {
            high_accuracy: settings.high_accuracy,
            timeout_ms: settings.timeout_ms,
            max_cached_age_ms: settings.max_cached_age_ms,
        }
    }
}

/// What a caller that may stop waiting gets back.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Completed(LocationStatus),
    Abandoned,
}
