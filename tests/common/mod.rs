#![allow(dead_code)]
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fieldnotes_lib::{
    config::AppConfig,
    location::{FixErrorCode, FixOptions, LocationApi, PermissionStatus},
    models::{Coordinate, LocationFix, Observation},
    storage::{KeyValueStore, MemoryStore},
    AppState,
};

/// Location API with a switchable permission answer and a fixed result.
pub struct ScriptedLocation {
    permission: Mutex<PermissionStatus>,
    result: Result<LocationFix, FixErrorCode>,
    pub fix_calls: AtomicUsize,
}

impl ScriptedLocation {
    pub fn granting(fix: LocationFix) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(PermissionStatus::Granted),
            result: Ok(fix),
            fix_calls: AtomicUsize::new(0),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(PermissionStatus::Denied),
            result: Err(FixErrorCode::PermissionDenied),
            fix_calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(code: FixErrorCode) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(PermissionStatus::Granted),
            result: Err(code),
            fix_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        *self.permission.lock().unwrap() = permission;
    }
}

#[async_trait]
impl LocationApi for ScriptedLocation {
    async fn request_permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap()
    }

    async fn current_fix(&self, _options: FixOptions) -> Result<LocationFix, FixErrorCode> {
        self.fix_calls.fetch_add(1, Ordering::SeqCst);
        self.result
    }
}

/// Backend whose writes can be made to fail, for failure-path tests.
#[derive(Default)]
pub struct FailingWrites {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FailingWrites {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FailingWrites {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("storage quota exceeded");
        }
        self.inner.set(key, value).await
    }
}

pub fn lyon() -> LocationFix {
    LocationFix::new(45.764, 4.8357, 10.0)
}

/// App state on a fresh SQLite file inside `dir`.
pub fn sqlite_state(dir: &std::path::Path, api: Arc<dyn LocationApi>) -> AppState {
    let config = AppConfig {
        data_dir: dir.to_path_buf(),
        ..AppConfig::default()
    };
    AppState::bootstrap(config, api).expect("bootstrap app state")
}

pub fn observation(id: &str, name: &str, day: u32) -> Observation {
    Observation {
        id: id.into(),
        name: name.into(),
        date: Utc.with_ymd_and_hms(2025, 3, day, 10, 0, 0).unwrap(),
        coordinate: Coordinate::new(4.8357, 45.764),
        photo: None,
    }
}
