//! Map-ready projection of the current fix and the stored observations.
//!
//! The renderer only draws; selection events come back through
//! [`MapScene::select`] and become edit requests.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::{CameraSettings, MapSettings},
    models::{Coordinate, LocationFix, Observation},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub coordinate: Coordinate,
    pub label: String,
}

/// What the edit screen is opened with.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub center: Coordinate,
    pub accuracy: f64,
    pub style_url: String,
    pub camera: CameraSettings,
    pub annotations: Vec<Annotation>,
    /// Last appended observation, independent of its date.
    pub focus: Option<Annotation>,
    #[serde(skip)]
    observations: Vec<Observation>,
}

impl MapScene {
    pub fn build(fix: LocationFix, observations: Vec<Observation>, settings: &MapSettings) -> Self {
        let annotations: Vec<Annotation> = observations.iter().map(annotation_for).collect();
        let focus = annotations.last().cloned();

        Self {
            center: fix.coordinate(),
            accuracy: fix.accuracy,
            style_url: settings.style.url().to_string(),
            camera: settings.camera.clone(),
            annotations,
            focus,
            observations,
        }
    }

    pub fn select(&self, id: &str) -> Option<EditRequest> {
        self.observations
            .iter()
            .find(|o| o.id == id)
            .map(|o| EditRequest {
                id: o.id.clone(),
                name: o.name.clone(),
                date: o.date,
            })
    }
}

fn annotation_for(observation: &Observation) -> Annotation {
    let label = if observation.name.trim().is_empty() {
        observation.date.format("%Y-%m-%d").to_string()
    } else {
        observation.name.clone()
    };
    Annotation {
        id: observation.id.clone(),
        coordinate: observation.coordinate,
        label,
    }
}
