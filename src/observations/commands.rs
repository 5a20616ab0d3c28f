use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    form::{ObservationFormController, Submission},
    map::{EditRequest, MapScene},
    models::Observation,
    observations::{MutationOutcome, ObservationStore},
    AppState,
};

fn store_from_state(state: &AppState) -> ObservationStore {
    state.store.clone()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationInput {
    pub name: String,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationEdit {
    pub name: String,
    pub date: DateTime<Utc>,
}

pub async fn list_observations(state: &AppState) -> Result<Vec<Observation>, String> {
    store_from_state(state)
        .list_all()
        .await
        .map_err(|e| e.to_string())
}

/// Create from the form fields and the provider's current fix.
pub async fn create_observation(
    state: &AppState,
    input: ObservationInput,
) -> Result<Observation, String> {
    let mut form =
        ObservationFormController::new_observation(store_from_state(state), state.location.clone());
    form.set_name(input.name);
    if let Some(date) = input.date {
        form.set_date(date);
    }
    if let Some(photo) = input.photo {
        form.set_photo(photo);
    }

    match form.submit().await.map_err(|e| e.to_string())? {
        Submission::Created { observation } => Ok(observation),
        other => Err(format!("unexpected submission result: {other:?}")),
    }
}

pub async fn update_observation(
    state: &AppState,
    id: String,
    edit: ObservationEdit,
) -> Result<MutationOutcome, String> {
    let store = store_from_state(state);
    let Some(existing) = store.get(&id).await.map_err(|e| e.to_string())? else {
        return Ok(MutationOutcome::NotFound);
    };

    let mut form = ObservationFormController::for_edit(store, &existing);
    form.set_name(edit.name);
    form.set_date(edit.date);

    match form.submit().await.map_err(|e| e.to_string())? {
        Submission::Updated { .. } => Ok(MutationOutcome::Applied),
        Submission::Missing { .. } => Ok(MutationOutcome::NotFound),
        other => Err(format!("unexpected submission result: {other:?}")),
    }
}

pub async fn delete_observation(state: &AppState, id: String) -> Result<MutationOutcome, String> {
    store_from_state(state)
        .remove(&id)
        .await
        .map_err(|e| e.to_string())
}

/// `Ok(None)` until the provider has produced a fix.
pub async fn get_map_scene(state: &AppState) -> Result<Option<MapScene>, String> {
    let Some(fix) = state.location.last_fix().await else {
        return Ok(None);
    };
    let observations = store_from_state(state)
        .list_all()
        .await
        .map_err(|e| e.to_string())?;
    Ok(Some(MapScene::build(fix, observations, &state.config.map)))
}

pub async fn select_observation(state: &AppState, id: String) -> Result<Option<EditRequest>, String> {
    let Some(scene) = get_map_scene(state).await? else {
        return Ok(None);
    };
    Ok(scene.select(&id))
}
