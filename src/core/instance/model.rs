use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Loader a build runs with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    #[serde(alias = "none")]
    Vanilla,
    Fabric,
    Forge,
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "vanilla"),
            LoaderType::Fabric => write!(f, "fabric"),
            LoaderType::Forge => write!(f, "forge"),
        }
    }
}

impl std::str::FromStr for LoaderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vanilla" | "none" => Ok(LoaderType::Vanilla),
            "fabric" => Ok(LoaderType::Fabric),
            "forge" => Ok(LoaderType::Forge),
            other => Err(format!("unknown loader '{}'", other)),
        }
    }
}

/// One build the user can launch, persisted as `build.json` in its
/// directory under `instances/`. The launch pipeline only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildDescriptor {
    pub id: String,
    pub name: String,
    pub game_version: String,
    #[serde(default)]
    pub loader: LoaderType,
    /// Pinned loader release; the newest one is used when absent.
    #[serde(default)]
    pub loader_version: Option<String>,
    /// Directory name under `instances/`.
    pub dir_name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl BuildDescriptor {
    pub fn new(
        name: impl Into<String>,
        game_version: impl Into<String>,
        loader: LoaderType,
        loader_version: Option<String>,
        dir_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            game_version: game_version.into(),
            loader,
            loader_version,
            dir_name: dir_name.into(),
            created_at: Utc::now(),
        }
    }
}
