use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{Observation, ObservationPatch},
    storage::KeyValueStore,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Result of an id-addressed mutation. A missing id is reported, not raised.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MutationOutcome {
    Applied,
    NotFound,
}

/// Owns the observation list persisted as one JSON blob under `key`.
///
/// Every operation is a full read-modify-write cycle held under `write_lock`,
/// so two callers on the same store never interleave. Mutations happen on an
/// in-memory copy; when the write fails the copy is dropped and the durable
/// blob is whatever it was before the call.
#[derive(Clone)]
pub struct ObservationStore {
    backend: Arc<dyn KeyValueStore>,
    key: Arc<str>,
    write_lock: Arc<Mutex<()>>,
}

impl ObservationStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key: String = key.into();
        Self {
            backend,
            key: Arc::from(key),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Observation>> {
        let _guard = self.write_lock.lock().await;
        self.load().await
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Observation>> {
        let list = self.list_all().await?;
        Ok(list.into_iter().find(|o| o.id == id))
    }

    /// The record a map should focus on: the last one appended, whatever its date.
    pub async fn most_recent(&self) -> AppResult<Option<Observation>> {
        let mut list = self.list_all().await?;
        Ok(list.pop())
    }

    /// Append without an id collision check; callers mint fresh ids.
    pub async fn append(&self, observation: Observation) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut list = self.load().await?;
        let id = observation.id.clone();
        list.push(observation);
        self.persist(&list).await?;
        log_info!("appended observation {} ({} total)", id, list.len());
        Ok(())
    }

    pub async fn update(&self, id: &str, patch: ObservationPatch) -> AppResult<MutationOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut list = self.load().await?;

        let Some(target) = list.iter_mut().find(|o| o.id == id) else {
            log_debug!("update skipped, no observation {}", id);
            return Ok(MutationOutcome::NotFound);
        };
        target.apply(patch);

        self.persist(&list).await?;
        log_info!("updated observation {}", id);
        Ok(MutationOutcome::Applied)
    }

    pub async fn remove(&self, id: &str) -> AppResult<MutationOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut list = self.load().await?;

        let before = list.len();
        list.retain(|o| o.id != id);
        if list.len() == before {
            log_debug!("remove skipped, no observation {}", id);
            return Ok(MutationOutcome::NotFound);
        }

        self.persist(&list).await?;
        log_info!("removed observation {} ({} left)", id, list.len());
        Ok(MutationOutcome::Applied)
    }

    /// Caller must hold `write_lock`.
    async fn load(&self) -> AppResult<Vec<Observation>> {
        let raw = self
            .backend
            .get(&self.key)
            .await
            .with_context(|| format!("failed to read '{}'", self.key))
            .map_err(AppError::storage)?;

        match raw {
            None => Ok(Vec::new()),
            Some(blob) => serde_json::from_str(&blob)
                .with_context(|| format!("stored '{}' list is not valid", self.key))
                .map_err(|err| {
                    log_error!("{err:#}");
                    AppError::storage(err)
                }),
        }
    }

    /// Caller must hold `write_lock`.
    async fn persist(&self, list: &[Observation]) -> AppResult<()> {
        let blob = serde_json::to_string(list)
            .context("failed to serialize observations")
            .map_err(AppError::storage)?;

        self.backend
            .set(&self.key, blob)
            .await
            .with_context(|| format!("failed to write '{}'", self.key))
            .map_err(|err| {
                log_error!("{err:#}");
                AppError::storage(err)
            })
    }
}
