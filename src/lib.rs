mod utils;

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod location;
pub mod map;
pub mod models;
pub mod observations;
pub mod storage;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use config::AppConfig;
use db::Database;
use location::{LocationApi, LocationProvider};
use observations::ObservationStore;
use storage::KeyValueStore;

pub use error::{AppError, AppResult};
pub use utils::init_logging;

/// Long-lived components for one application session.
///
/// Screens reach the core only through the command functions in
/// [`location::commands`] and [`observations::commands`].
pub struct AppState {
    pub config: AppConfig,
    pub store: ObservationStore,
    pub location: LocationProvider,
}

impl AppState {
    /// Open the SQLite store under `config.data_dir` and wire the components.
    pub fn bootstrap(config: AppConfig, location_api: Arc<dyn LocationApi>) -> Result<Self> {
        init_logging();
        config.validate().context("invalid configuration")?;

        let db_path = config.database_path();
        let database = Database::new(db_path).context("failed to open observation database")?;

        info!(
            "Field notes starting (platform {:?}, storage key '{}')",
            config.platform, config.storage_key
        );
        Ok(Self::with_backend(config, Arc::new(database), location_api))
    }

    /// Wire the components over an already-open backend.
    pub fn with_backend(
        config: AppConfig,
        backend: Arc<dyn KeyValueStore>,
        location_api: Arc<dyn LocationApi>,
    ) -> Self {
        let store = ObservationStore::new(backend, config.storage_key.clone());
        let location = LocationProvider::new(location_api, config.platform, &config.location);
        Self {
            config,
            store,
            location,
        }
    }
}
