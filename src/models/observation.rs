//! Persisted observation records.
//!
//! The JSON shape is the storage blob format:
//! `{ "id", "name", "date", "coordinate": [longitude, latitude], "photo"? }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `(longitude, latitude)`, stored as a two-element array in that order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(coordinate: Coordinate) -> Self {
        (coordinate.longitude, coordinate.latitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub coordinate: Coordinate,
    /// Opaque handle to image data held elsewhere (a URI on device).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Observation {
    /// Shallow merge: every field present in `patch` replaces ours.
    /// `id` and `coordinate` are fixed for the record's lifetime.
    pub fn apply(&mut self, patch: ObservationPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(photo) = patch.photo {
            self.photo = Some(photo);
        }
    }
}

/// Fields an edit may replace. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl ObservationPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}
