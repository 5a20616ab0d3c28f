pub mod commands;
pub mod provider;
pub mod state;

pub use provider::{LocationApi, LocationProvider};
pub use state::{
    FailureKind, FetchOutcome, FixErrorCode, FixOptions, LocationFailure, LocationStatus,
    PermissionStatus,
};
