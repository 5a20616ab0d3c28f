use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_STORAGE_KEY: &str = "observations";
pub const DEFAULT_DATABASE_FILE: &str = "fieldnotes.sqlite3";

const ENV_DATA_DIR: &str = "FIELDNOTES_DATA_DIR";
const ENV_STORAGE_KEY: &str = "FIELDNOTES_STORAGE_KEY";
const ENV_MAP_TOKEN: &str = "FIELDNOTES_MAP_TOKEN";

/// Host platform. Decides whether location permission needs a prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    #[default]
    Android,
    Ios,
}

impl Platform {
    /// iOS grants foreground location through the system sheet shown on first
    /// use; there is nothing for the app to prompt.
    pub fn permission_is_implicit(self) -> bool {
        matches!(self, Platform::Ios)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationSettings {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub max_cached_age_ms: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            max_cached_age_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MapStyle {
    #[default]
    Street,
    Satellite,
}

impl MapStyle {
    pub fn url(self) -> &'static str {
        match self {
            MapStyle::Street => "mapbox://styles/mapbox/streets-v12",
            MapStyle::Satellite => "mapbox://styles/mapbox/satellite-v9",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnimationMode {
    #[default]
    FlyTo,
    EaseTo,
    LinearTo,
    MoveTo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    pub zoom_level: f64,
    pub animation_mode: AnimationMode,
    pub animation_duration_ms: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            zoom_level: 15.0,
            animation_mode: AnimationMode::FlyTo,
            animation_duration_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MapSettings {
    /// Public token for the tile provider. Never logged.
    pub access_token: Option<String>,
    pub style: MapStyle,
    pub camera: CameraSettings,
}

/// Everything the core needs from its host, passed to constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub storage_key: String,
    pub platform: Platform,
    pub location: LocationSettings,
    pub map: MapSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: DEFAULT_DATABASE_FILE.into(),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            platform: Platform::default(),
            location: LocationSettings::default(),
            map: MapSettings::default(),
        }
    }
}

impl AppConfig {
    /// Read the config file at `path` if it exists, then apply environment
    /// overrides. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            AppConfig::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `FIELDNOTES_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup(ENV_STORAGE_KEY).filter(|v| !v.is_empty()) {
            self.storage_key = key;
        }
        if let Some(token) = lookup(ENV_MAP_TOKEN).filter(|v| !v.is_empty()) {
            self.map.access_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            bail!("storage_key must not be empty");
        }
        if self.database_file.trim().is_empty() {
            bail!("database_file must not be empty");
        }
        if self.location.timeout_ms == 0 {
            bail!("location.timeout_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
