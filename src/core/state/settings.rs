use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::{info, warn};

use crate::core::auth::DEFAULT_USERNAME;
use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "burrow";
pub const SETTINGS_FILE: &str = "config.json";

const MIN_MEMORY_MB: u64 = 1024;
const MAX_MEMORY_MB: u64 = 8192;

/// User-level launcher settings, persisted at `<data>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherSettings {
    pub java_path: Option<PathBuf>,
    pub memory_mb: u32,
    /// Overrides `<data>/libraries`.
    pub library_path: Option<PathBuf>,
    /// Overrides `<data>/assets`.
    pub assets_path: Option<PathBuf>,
    pub language: String,
    pub brand: String,
    /// Joined directly on start when set.
    pub server_address: Option<String>,
    pub username: String,
    /// Parallel downloads per batch.
    pub download_threads: usize,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            java_path: None,
            memory_mb: 1024,
            library_path: None,
            assets_path: None,
            language: "en".into(),
            brand: "Burrow".into(),
            server_address: None,
            username: DEFAULT_USERNAME.into(),
            download_threads: 8,
        }
    }
}

impl LauncherSettings {
    /// Settings from `<data>/config.json`; defaults when the file is absent.
    pub fn load(data_dir: &Path) -> LauncherResult<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| LauncherError::io(&path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like `load`, but a corrupt file falls back to defaults.
    pub fn load_or_default(data_dir: &Path) -> Self {
        Self::load(data_dir).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, data_dir: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(data_dir).map_err(|e| LauncherError::io(data_dir, e))?;
        let path = data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::io(&path, e))
    }
}

/// Directory layout under the launcher data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    pub data: PathBuf,
    pub libraries: PathBuf,
    pub assets: PathBuf,
    pub versions: PathBuf,
    pub instances: PathBuf,
    pub cache: PathBuf,
}

impl LauncherPaths {
    pub fn new(data: impl Into<PathBuf>) -> Self {
        let data = data.into();
        Self {
            libraries: data.join("libraries"),
            assets: data.join("assets"),
            versions: data.join("versions"),
            instances: data.join("instances"),
            cache: data.join("cache"),
            data,
        }
    }

    /// `<platform data dir>/burrow`, or `override_dir` when given.
    pub fn resolve(override_dir: Option<PathBuf>) -> Self {
        let data = override_dir.unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        });
        Self::new(data)
    }

    /// Applies the library and asset overrides from `settings`.
    pub fn with_settings(mut self, settings: &LauncherSettings) -> Self {
        if let Some(libraries) = &settings.library_path {
            self.libraries = libraries.clone();
        }
        if let Some(assets) = &settings.assets_path {
            self.assets = assets.clone();
        }
        self
    }
}

/// A quarter of physical memory, clamped to 1..8 GiB.
pub fn recommended_memory_mb() -> u32 {
    let mut system = System::new();
    system.refresh_memory();
    let total_mb = system.total_memory() / (1024 * 1024);
    let recommended = clamp_memory(total_mb / 4);
    info!("Total memory {} MB, recommending {} MB", total_mb, recommended);
    recommended
}

fn clamp_memory(mb: u64) -> u32 {
    mb.clamp(MIN_MEMORY_MB, MAX_MEMORY_MB) as u32
}
