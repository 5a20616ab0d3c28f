//! Fakes for the platform collaborators, shared by unit tests.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::{
    form::PhotoSource,
    location::{FixErrorCode, FixOptions, LocationApi, PermissionStatus},
    models::LocationFix,
    storage::{KeyValueStore, MemoryStore},
};

/// In-memory backend whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("quota exceeded");
        }
        self.inner.set(key, value).await
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FixBehavior {
    Succeed(LocationFix),
    Fail(FixErrorCode),
    Delay(Duration, LocationFix),
    Hang,
}

pub struct FakeLocationApi {
    permission: Mutex<PermissionStatus>,
    behavior: Mutex<FixBehavior>,
    options: Mutex<Option<FixOptions>>,
    prompt_delay: Option<Duration>,
    pub permission_calls: AtomicUsize,
    pub fix_calls: AtomicUsize,
}

impl FakeLocationApi {
    pub fn new(permission: PermissionStatus, behavior: FixBehavior) -> Self {
        Self {
            permission: Mutex::new(permission),
            behavior: Mutex::new(behavior),
            options: Mutex::new(None),
            prompt_delay: None,
            permission_calls: AtomicUsize::new(0),
            fix_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.prompt_delay = Some(delay);
        self
    }

    pub fn set_behavior(&self, behavior: FixBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        *self.permission.lock().unwrap() = permission;
    }

    pub fn last_options(&self) -> Option<FixOptions> {
        *self.options.lock().unwrap()
    }
}

#[async_trait]
impl LocationApi for FakeLocationApi {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.prompt_delay {
            tokio::time::sleep(delay).await;
        }
        *self.permission.lock().unwrap()
    }

    async fn current_fix(&self, options: FixOptions) -> Result<LocationFix, FixErrorCode> {
        self.fix_calls.fetch_add(1, Ordering::SeqCst);
        *self.options.lock().unwrap() = Some(options);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            FixBehavior::Succeed(fix) => Ok(fix),
            FixBehavior::Fail(code) => Err(code),
            FixBehavior::Delay(delay, fix) => {
                tokio::time::sleep(delay).await;
                Ok(fix)
            }
            FixBehavior::Hang => std::future::pending().await,
        }
    }
}

pub struct FakePhotoSource {
    pub camera_permission: PermissionStatus,
    pub library_permission: PermissionStatus,
    pub camera_result: Option<String>,
    pub library_result: Option<String>,
    pub captures: AtomicUsize,
}

impl FakePhotoSource {
    pub fn granting(camera: Option<&str>, library: Option<&str>) -> Self {
        Self {
            camera_permission: PermissionStatus::Granted,
            library_permission: PermissionStatus::Granted,
            camera_result: camera.map(str::to_string),
            library_result: library.map(str::to_string),
            captures: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PhotoSource for FakePhotoSource {
    async fn request_camera_permission(&self) -> PermissionStatus {
        self.camera_permission
    }

    async fn request_library_permission(&self) -> PermissionStatus {
        self.library_permission
    }

    async fn capture_from_camera(&self) -> Option<String> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        self.camera_result.clone()
    }

    async fn pick_from_library(&self) -> Option<String> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        self.library_result.clone()
    }
}
