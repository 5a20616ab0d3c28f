pub mod controller;
pub mod photo;

pub use controller::{FormMode, ObservationFormController, Submission};
pub use photo::{acquire_photo, PhotoKind, PhotoOutcome, PhotoSource};
