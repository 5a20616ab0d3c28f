use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::location::PermissionStatus;

/// Device camera and photo library, each behind its own permission.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn request_camera_permission(&self) -> PermissionStatus;

    async fn request_library_permission(&self) -> PermissionStatus;

    /// `None` when the user backs out of the camera.
    async fn capture_from_camera(&self) -> Option<String>;

    /// `None` when the user backs out of the picker.
    async fn pick_from_library(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PhotoKind {
    Camera,
    Library,
}

impl PhotoKind {
    pub fn denied_message(self) -> &'static str {
        match self {
            PhotoKind::Camera => "Allow camera access in Settings.",
            PhotoKind::Library => "Allow photo library access in Settings.",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "detail")]
pub enum PhotoOutcome {
    Attached(String),
    Cancelled,
    PermissionDenied(String),
}

/// Ask for the matching permission, then capture or pick.
pub async fn acquire_photo(source: &dyn PhotoSource, kind: PhotoKind) -> PhotoOutcome {
    let permission = match kind {
        PhotoKind::Camera => source.request_camera_permission().await,
        PhotoKind::Library => source.request_library_permission().await,
    };
    if permission == PermissionStatus::Denied {
        return PhotoOutcome::PermissionDenied(kind.denied_message().to_string());
    }

    let handle = match kind {
        PhotoKind::Camera => source.capture_from_camera().await,
        PhotoKind::Library => source.pick_from_library().await,
    };
    match handle {
        Some(handle) => PhotoOutcome::Attached(handle),
        None => PhotoOutcome::Cancelled,
    }
}
