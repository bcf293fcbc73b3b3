use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::{download_pending, DownloadBatch, Gateway};
use crate::core::progress::StatusSink;
use crate::core::version::VersionJson;

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";
pub const ASSETS_LABEL: &str = "Assets downloaded";

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetObject {
    /// Content-addressed location under `objects/`: `<hash[0..2]>/<hash>`.
    pub fn object_path(&self) -> Option<String> {
        let shard = self.hash.get(..2)?;
        Some(format!("{}/{}", shard, self.hash))
    }
}

impl AssetIndex {
    /// Distinct object paths, in index order.
    pub fn object_paths(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut paths = Vec::new();

        for (name, object) in &self.objects {
            let Some(path) = object.object_path() else {
                warn!("Skipping asset {} with malformed hash {:?}", name, object.hash);
                continue;
            };
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
        paths
    }
}

/// Brings `<assets>/indexes` and `<assets>/objects` up to date for a manifest.
pub struct AssetSynchronizer<'a> {
    gateway: &'a dyn Gateway,
    assets_root: PathBuf,
    status: &'a StatusSink,
}

impl<'a> AssetSynchronizer<'a> {
    pub fn new(gateway: &'a dyn Gateway, assets_root: impl Into<PathBuf>, status: &'a StatusSink) -> Self {
        Self {
            gateway,
            assets_root: assets_root.into(),
            status,
        }
    }

    /// Returns the assets root once every object of the index is on disk.
    pub async fn sync(&self, manifest: &VersionJson) -> LauncherResult<PathBuf> {
        self.status.set("Checking assets");

        let index = self.load_index(manifest).await?;
        let objects_dir = self.assets_root.join("objects");
        self.gateway.create_dir(&objects_dir).await?;

        let paths = index.object_paths();
        let missing = self.gateway.list_missing(&objects_dir, &paths).await?;

        info!(
            "Assets: {} objects, {} already present",
            paths.len(),
            paths.len().saturating_sub(missing.len())
        );

        let batch: DownloadBatch = missing
            .into_iter()
            .map(|name| {
                let dest = objects_dir.join(&name);
                (format!("{}/{}", RESOURCES_URL, name), dest)
            })
            .collect();

        download_pending(self.gateway, batch, ASSETS_LABEL, self.status).await?;
        Ok(self.assets_root.clone())
    }

    async fn load_index(&self, manifest: &VersionJson) -> LauncherResult<AssetIndex> {
        let id = manifest
            .asset_index_id()
            .ok_or_else(|| LauncherError::NotFound(format!("asset index for {}", manifest.id)))?;

        let indexes_dir = self.assets_root.join("indexes");
        let index_path = indexes_dir.join(format!("{}.json", id));

        if !self.gateway.exists(&index_path).await {
            let info = manifest.asset_index.as_ref().ok_or_else(|| {
                LauncherError::NotFound(format!("asset index url for {}", manifest.id))
            })?;
            let document = self.gateway.get_json(&info.url).await?;

            self.gateway.create_dir(&indexes_dir).await?;
            self.gateway
                .write_text(&index_path, &serde_json::to_string_pretty(&document)?)
                .await?;
            info!("Saved asset index {:?}", index_path);
        }

        let raw = self.gateway.read_text(&index_path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
