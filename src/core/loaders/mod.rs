// ─── Loader Overlays ───
// A build runs either vanilla or with one loader layered over the base
// libraries. Each variant resolves its extra libraries, main class and
// arguments through `Overlay::apply`.

pub mod catalog;
mod fabric;
mod forge;

use std::path::Path;

use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::gateway::Gateway;
use crate::core::instance::LoaderType;
use crate::core::libraries::ResolvedLibrary;
use crate::core::platform::Platform;
use crate::core::progress::StatusSink;
use crate::core::version::VersionJson;

pub use catalog::{FabricLoaderRelease, ForgeChannel, ForgeVersion, LoaderCatalog};
pub use fabric::KNOT_CLIENT;
pub use forge::{forge_version_id, substitute_jvm_args, ForgeInstallState, ForgeLayout};

/// Everything an overlay needs from the launch in progress.
pub struct OverlayContext<'a> {
    pub gateway: &'a dyn Gateway,
    pub status: &'a StatusSink,
    pub platform: &'a Platform,
    pub catalog: &'a LoaderCatalog,
    pub base: &'a VersionJson,
    pub game_version: &'a str,
    pub loader_version: Option<&'a str>,
    pub data_dir: &'a Path,
    pub library_root: &'a Path,
    pub instance_dir: &'a Path,
    pub java_path: &'a Path,
}

/// What an overlay contributes to the launch.
#[derive(Debug, Clone, Default)]
pub struct OverlayOutcome {
    /// Merged over the base set; same short name means the overlay wins.
    pub libraries: Vec<ResolvedLibrary>,
    pub main_class: String,
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Vanilla,
    Fabric,
    Forge,
}

impl From<&LoaderType> for Overlay {
    fn from(loader: &LoaderType) -> Self {
        match loader {
            LoaderType::Vanilla => Overlay::Vanilla,
            LoaderType::Fabric => Overlay::Fabric,
            LoaderType::Forge => Overlay::Forge,
        }
    }
}

impl Overlay {
    /// The installer patches a private copy of the client jar.
    pub fn uses_build_local_client(self) -> bool {
        matches!(self, Overlay::Forge)
    }

    /// Module system opens the loader needs on modern runtimes.
    pub fn needs_module_opens(self) -> bool {
        matches!(self, Overlay::Forge)
    }

    pub async fn apply(self, ctx: &OverlayContext<'_>) -> LauncherResult<OverlayOutcome> {
        info!("Applying {:?} overlay for {}", self, ctx.game_version);
        match self {
            Overlay::Vanilla => Ok(OverlayOutcome {
                main_class: ctx.base.vanilla_main_class(ctx.game_version),
                ..OverlayOutcome::default()
            }),
            Overlay::Fabric => fabric::apply(ctx).await,
            Overlay::Forge => forge::apply(ctx).await,
        }
    }
}
