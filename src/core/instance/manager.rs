use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::model::{BuildDescriptor, LoaderType};
use super::naming::unique_dir_name;
use crate::core::error::{LauncherError, LauncherResult};

pub const BUILD_FILE: &str = "build.json";

/// Build descriptors on disk, one directory per build under `instances/`.
pub struct BuildStore {
    instances_dir: PathBuf,
}

impl BuildStore {
    pub fn new(instances_dir: impl Into<PathBuf>) -> Self {
        Self {
            instances_dir: instances_dir.into(),
        }
    }

    pub fn instance_dir(&self, build: &BuildDescriptor) -> PathBuf {
        self.instances_dir.join(&build.dir_name)
    }

    /// Create a build with a fresh directory named after `name`.
    ///
    /// Creates:
    /// - `<instance>/`
    /// - `<instance>/mods/`
    /// - `<instance>/build.json`
    pub async fn create(
        &self,
        name: &str,
        game_version: &str,
        loader: LoaderType,
        loader_version: Option<String>,
    ) -> LauncherResult<BuildDescriptor> {
        let dir_name = unique_dir_name(name, |candidate| {
            self.instances_dir.join(candidate).exists()
        });
        let build = BuildDescriptor::new(name, game_version, loader, loader_version, dir_name);

        let mods_dir = self.instance_dir(&build).join("mods");
        tokio::fs::create_dir_all(&mods_dir)
            .await
            .map_err(|e| LauncherError::io(&mods_dir, e))?;

        self.save(&build).await?;
        info!(
            "Created build '{}' ({} {}) in {}",
            build.name, build.game_version, build.loader, build.dir_name
        );
        Ok(build)
    }

    pub async fn save(&self, build: &BuildDescriptor) -> LauncherResult<()> {
        let json = serde_json::to_string_pretty(build)?;
        let dir = self.instance_dir(build);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LauncherError::io(&dir, e))?;

        let path = dir.join(BUILD_FILE);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    /// Load a build by its directory name.
    pub async fn load(&self, dir_name: &str) -> LauncherResult<BuildDescriptor> {
        let path = self.instances_dir.join(dir_name).join(BUILD_FILE);
        if !path.exists() {
            return Err(LauncherError::NotFound(format!("build '{}'", dir_name)));
        }
        load_descriptor(&path).await
    }

    /// Every readable build; corrupt descriptors are skipped.
    pub async fn list(&self) -> LauncherResult<Vec<BuildDescriptor>> {
        let mut builds = Vec::new();
        if !self.instances_dir.exists() {
            return Ok(builds);
        }

        let mut entries = tokio::fs::read_dir(&self.instances_dir)
            .await
            .map_err(|e| LauncherError::io(&self.instances_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(&self.instances_dir, e))?
        {
            let path = entry.path().join(BUILD_FILE);
            if !path.is_file() {
                continue;
            }
            match load_descriptor(&path).await {
                Ok(build) => builds.push(build),
                Err(e) => warn!("Skipping {:?}: {}", path, e),
            }
        }

        builds.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(builds)
    }
}

/// Read one `build.json` from any location.
pub async fn load_descriptor(path: &Path) -> LauncherResult<BuildDescriptor> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    Ok(serde_json::from_str(&json)?)
}
