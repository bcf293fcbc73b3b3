// ─── Loader Catalogs ───
// Release listings for Fabric and Forge per game version, memoized in a
// small LRU so switching between versions does not evict the other one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::Gateway;

pub const FABRIC_META: &str = "https://meta.fabricmc.net/v2/versions/loader";
pub const BMCLAPI_FORGE: &str = "https://bmclapi2.bangbang93.com/forge/minecraft";
pub const FORGE_PROMOTIONS: &str =
    "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json";

/// Number of game versions kept per catalog.
const CATALOG_CAPACITY: u64 = 16;

// ─── Fabric ───

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricLoaderRelease {
    pub loader: FabricComponent,
    pub intermediary: FabricComponent,
    pub launcher_meta: FabricLauncherMeta,
}

/// `loader` / `intermediary` entry of a Fabric release.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FabricComponent {
    pub maven: String,
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FabricLauncherMeta {
    #[serde(default)]
    pub libraries: FabricLibraries,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FabricLibraries {
    #[serde(default)]
    pub common: Vec<FabricLibrary>,
    #[serde(default)]
    pub client: Vec<FabricLibrary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FabricLibrary {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

// ─── Forge ───

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgeChannel {
    Common,
    Latest,
    Recommended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForgeVersion {
    pub version: String,
    pub date: Option<DateTime<Utc>>,
    pub channel: ForgeChannel,
}

/// One entry of the BMCLAPI Forge listing.
#[derive(Debug, Deserialize)]
struct BmclForgeEntry {
    version: String,
    #[serde(default, alias = "date")]
    modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ForgePromotions {
    #[serde(default)]
    promos: std::collections::BTreeMap<String, String>,
}

/// Memoized loader listings keyed by game version.
pub struct LoaderCatalog {
    fabric: Cache<String, Arc<Vec<FabricLoaderRelease>>>,
    forge: Cache<String, Arc<Vec<ForgeVersion>>>,
}

impl LoaderCatalog {
    pub fn new() -> Self {
        Self {
            fabric: Cache::builder().max_capacity(CATALOG_CAPACITY).build(),
            forge: Cache::builder().max_capacity(CATALOG_CAPACITY).build(),
        }
    }

    /// Fabric loader releases for `game_version`, newest first.
    pub async fn fabric_releases(
        &self,
        gateway: &dyn Gateway,
        game_version: &str,
    ) -> LauncherResult<Arc<Vec<FabricLoaderRelease>>> {
        if let Some(hit) = self.fabric.get(game_version).await {
            debug!("Fabric catalog for {} served from cache", game_version);
            return Ok(hit);
        }

        let url = format!("{}/{}", FABRIC_META, game_version);
        let releases: Vec<FabricLoaderRelease> = serde_json::from_value(gateway.get_json(&url).await?)?;
        info!("Fabric: {} loader releases for {}", releases.len(), game_version);

        let releases = Arc::new(releases);
        self.fabric
            .insert(game_version.to_string(), releases.clone())
            .await;
        Ok(releases)
    }

    /// Forge versions for `game_version`.
    ///
    /// Uses the BMCLAPI listing sorted newest first; when it is unavailable
    /// falls back to the `latest` / `recommended` promotions.
    pub async fn forge_versions(
        &self,
        gateway: &dyn Gateway,
        game_version: &str,
    ) -> LauncherResult<Arc<Vec<ForgeVersion>>> {
        if let Some(hit) = self.forge.get(game_version).await {
            debug!("Forge catalog for {} served from cache", game_version);
            return Ok(hit);
        }

        let versions = match bmcl_listing(gateway, game_version).await {
            Ok(versions) => versions,
            Err(e) => {
                warn!("Forge listing unavailable ({}), using promotions", e);
                promotions(gateway, game_version).await?
            }
        };
        info!("Forge: {} versions for {}", versions.len(), game_version);

        let versions = Arc::new(versions);
        self.forge
            .insert(game_version.to_string(), versions.clone())
            .await;
        Ok(versions)
    }
}

impl Default for LoaderCatalog {
    fn default() -> Self {
        Self::new()
    }
}

async fn bmcl_listing(gateway: &dyn Gateway, game_version: &str) -> LauncherResult<Vec<ForgeVersion>> {
    let url = format!("{}/{}", BMCLAPI_FORGE, game_version);
    let entries: Vec<BmclForgeEntry> = serde_json::from_value(gateway.get_json(&url).await?)?;

    let mut versions: Vec<ForgeVersion> = entries
        .into_iter()
        .map(|entry| ForgeVersion {
            version: entry.version,
            date: entry.modified,
            channel: ForgeChannel::Common,
        })
        .collect();
    // `None` sorts below every date, so undated entries end up last.
    versions.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(versions)
}

async fn promotions(gateway: &dyn Gateway, game_version: &str) -> LauncherResult<Vec<ForgeVersion>> {
    let feed: ForgePromotions = serde_json::from_value(gateway.get_json(FORGE_PROMOTIONS).await?)?;

    let versions: Vec<ForgeVersion> = [
        ("latest", ForgeChannel::Latest),
        ("recommended", ForgeChannel::Recommended),
    ]
    .into_iter()
    .filter_map(|(suffix, channel)| {
        feed.promos
            .get(&format!("{}-{}", game_version, suffix))
            .map(|version| ForgeVersion {
                version: version.clone(),
                date: None,
                channel,
            })
    })
    .collect();

    if versions.is_empty() {
        return Err(LauncherError::NotFound(format!(
            "Forge promotions for {}",
            game_version
        )));
    }
    Ok(versions)
}
