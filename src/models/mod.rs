pub mod location;
pub mod observation;

pub use location::LocationFix;
pub use observation::{Coordinate, Observation, ObservationPatch};
