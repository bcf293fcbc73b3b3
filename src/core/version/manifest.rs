// ─── Version Manifest ───
// Mojang version index (manifest v2) and the resolver that turns a version
// id into a parsed version JSON, caching documents on disk forever.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::version_file::VersionJson;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::Gateway;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version index.
#[derive(Debug, Deserialize)]
pub struct VersionIndex {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionIndex {
    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// Resolves version documents, reading through `<versions_dir>/<id>.json`.
pub struct ManifestResolver<'a> {
    gateway: &'a dyn Gateway,
    versions_dir: PathBuf,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(gateway: &'a dyn Gateway, versions_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            versions_dir: versions_dir.into(),
        }
    }

    pub fn cache_path(&self, version_id: &str) -> PathBuf {
        self.versions_dir.join(format!("{}.json", version_id))
    }

    pub async fn fetch_index(&self) -> LauncherResult<VersionIndex> {
        info!("Fetching Minecraft version manifest...");
        let index: VersionIndex =
            serde_json::from_value(self.gateway.get_json(VERSION_MANIFEST_URL).await?)?;
        info!("Loaded {} versions from manifest", index.versions.len());
        Ok(index)
    }

    /// A cached document is trusted as-is. Otherwise the index is consulted,
    /// the document fetched and persisted verbatim before it is returned.
    pub async fn resolve(&self, version_id: &str) -> LauncherResult<VersionJson> {
        let path = self.cache_path(version_id);

        if self.gateway.exists(&path).await {
            debug!("Using cached version JSON {:?}", path);
            return read_version(self.gateway, &path).await;
        }

        let index = self.fetch_index().await?;
        let entry = index
            .find_version(version_id)
            .ok_or_else(|| LauncherError::NotFound(format!("Minecraft version {}", version_id)))?;

        let document = self.gateway.get_json(&entry.url).await?;
        let manifest: VersionJson = serde_json::from_value(document.clone())?;

        self.gateway.create_dir(&self.versions_dir).await?;
        self.gateway
            .write_text(&path, &serde_json::to_string(&document)?)
            .await?;

        info!("Cached version {} at {:?}", version_id, path);
        Ok(manifest)
    }
}

/// Read and parse a version JSON from disk.
pub async fn read_version(gateway: &dyn Gateway, path: &Path) -> LauncherResult<VersionJson> {
    let raw = gateway.read_text(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
