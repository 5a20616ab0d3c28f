use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A single resolved position reading. Accuracy is in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }
}
