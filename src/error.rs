//! Error taxonomy shared by the location, store and form layers.
//!
//! Infrastructure code (`db`, `config` file IO) works in `anyhow::Result`;
//! the public operations convert at their boundary so callers can tell a
//! failed save apart from a failed location fetch.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    LocationUnavailable(String),

    #[error("{0}")]
    LocationTimeout(String),

    #[error("storage failure: {0:#}")]
    StorageFailure(#[source] anyhow::Error),

    #[error("no location fix available yet")]
    NoLocationFix,

    #[error("date {date} is after today ({today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("form is not editing an existing observation")]
    NotEditing,
}

impl AppError {
    pub fn storage(err: impl Into<anyhow::Error>) -> Self {
        AppError::StorageFailure(err.into())
    }

    /// Whether re-invoking the failed operation may succeed without the user
    /// changing anything first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::LocationUnavailable(_)
                | AppError::LocationTimeout(_)
                | AppError::StorageFailure(_)
                | AppError::PermissionDenied(_)
        )
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
