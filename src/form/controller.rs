use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    location::{LocationProvider, LocationStatus},
    models::{Observation, ObservationPatch},
    observations::{MutationOutcome, ObservationStore},
};

use super::photo::{acquire_photo, PhotoKind, PhotoOutcome, PhotoSource};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum Submission {
    Created { observation: Observation },
    Updated { id: String },
    /// The record being edited no longer exists.
    Missing { id: String },
}

/// Collects one observation's fields and turns them into a store write.
///
/// Create mode needs a `Ready` fix from the location provider; the
/// coordinate is copied from it at submit time. Edit mode only ever
/// rewrites `name` and `date`.
pub struct ObservationFormController {
    store: ObservationStore,
    location: Option<LocationProvider>,
    mode: FormMode,
    name: String,
    date: DateTime<Utc>,
    photo: Option<String>,
}

impl ObservationFormController {
    pub fn new_observation(store: ObservationStore, location: LocationProvider) -> Self {
        Self {
            store,
            location: Some(location),
            mode: FormMode::Create,
            name: String::new(),
            date: Utc::now(),
            photo: None,
        }
    }

    pub fn for_edit(store: ObservationStore, observation: &Observation) -> Self {
        Self {
            store,
            location: None,
            mode: FormMode::Edit {
                id: observation.id.clone(),
            },
            name: observation.name.clone(),
            date: observation.date,
            photo: observation.photo.clone(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    /// Set a handle obtained outside [`attach_photo`](Self::attach_photo).
    pub fn set_photo(&mut self, handle: impl Into<String>) {
        self.photo = Some(handle.into());
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    /// A denied permission or a cancelled capture leaves the current photo as is.
    pub async fn attach_photo(&mut self, source: &dyn PhotoSource, kind: PhotoKind) -> PhotoOutcome {
        let outcome = acquire_photo(source, kind).await;
        match &outcome {
            PhotoOutcome::Attached(handle) => self.photo = Some(handle.clone()),
            PhotoOutcome::PermissionDenied(_) => log_warn!("{kind:?} permission denied"),
            PhotoOutcome::Cancelled => {}
        }
        outcome
    }

    pub fn can_submit(&self) -> bool {
        match &self.mode {
            FormMode::Create => self
                .location
                .as_ref()
                .is_some_and(|provider| matches!(provider.status(), LocationStatus::Ready(_))),
            FormMode::Edit { .. } => true,
        }
    }

    pub async fn submit(&self) -> AppResult<Submission> {
        self.submit_as_of(Local::now().date_naive()).await
    }

    /// Submit with `today` as the latest acceptable calendar day.
    pub async fn submit_as_of(&self, today: NaiveDate) -> AppResult<Submission> {
        check_not_future(self.date, today)?;

        match &self.mode {
            FormMode::Create => {
                let fix = self
                    .location
                    .as_ref()
                    .map(|provider| provider.status())
                    .unwrap_or_default()
                    .into_fix()
                    .map_err(|err| match err {
                        AppError::LocationTimeout(_)
                        | AppError::LocationUnavailable(_)
                        | AppError::PermissionDenied(_) => AppError::NoLocationFix,
                        other => other,
                    })?;

                let observation = Observation {
                    id: Uuid::new_v4().to_string(),
                    name: self.name.clone(),
                    date: self.date,
                    coordinate: fix.coordinate(),
                    photo: self.photo.clone(),
                };
                self.store.append(observation.clone()).await?;
                Ok(Submission::Created { observation })
            }
            FormMode::Edit { id } => {
                let patch = ObservationPatch {
                    name: Some(self.name.clone()),
                    date: Some(self.date),
                    photo: None,
                };
                match self.store.update(id, patch).await? {
                    MutationOutcome::Applied => Ok(Submission::Updated { id: id.clone() }),
                    MutationOutcome::NotFound => {
                        log_info!("edited observation {} no longer exists", id);
                        Ok(Submission::Missing { id: id.clone() })
                    }
                }
            }
        }
    }

    pub async fn delete(&self) -> AppResult<MutationOutcome> {
        match &self.mode {
            FormMode::Edit { id } => self.store.remove(id).await,
            FormMode::Create => Err(AppError::NotEditing),
        }
    }
}

fn check_not_future(date: DateTime<Utc>, today: NaiveDate) -> AppResult<()> {
    let day = date.with_timezone(&Local).date_naive();
    if day > today {
        return Err(AppError::FutureDate { date: day, today });
    }
    Ok(())
}
