// ─── Launch Session ───
// One launch attempt: id, status line and cancellation token, plus the
// `Launcher` that drives every stage of the pipeline in order.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::core::assets::AssetSynchronizer;
use crate::core::auth::OfflineProfile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::Gateway;
use crate::core::instance::BuildDescriptor;
use crate::core::launch::{self, build_classpath, unpack_natives, CommandLine, LaunchParams, Started};
use crate::core::libraries::LibrarySetBuilder;
use crate::core::loaders::{LoaderCatalog, Overlay, OverlayContext};
use crate::core::platform::Platform;
use crate::core::progress::StatusSink;
use crate::core::state::{LauncherPaths, LauncherSettings};
use crate::core::version::{ClientPlacement, ClientVerifier, ManifestResolver};

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Manifest,
    Libraries,
    Assets,
    Client,
    Natives,
    Assemble,
}

pub struct LaunchSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub status: StatusSink,
    cancel: CancellationToken,
}

impl LaunchSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            status: StatusSink::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stops the pipeline at the next stage boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn checkpoint(&self, stage: Stage) -> LauncherResult<()> {
        if self.is_cancelled() {
            info!("Session {} cancelled before {:?}", self.id, stage);
            return Err(LauncherError::Cancelled(self.id));
        }
        Ok(())
    }
}

impl Default for LaunchSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A started game.
#[derive(Debug)]
pub struct LaunchHandle {
    pub command: CommandLine,
    pub instance_dir: PathBuf,
    pub started: Started,
}

pub struct Launcher {
    gateway: Arc<dyn Gateway>,
    paths: LauncherPaths,
    settings: LauncherSettings,
    platform: Platform,
    catalog: LoaderCatalog,
}

impl Launcher {
    pub fn new(gateway: Arc<dyn Gateway>, paths: LauncherPaths, settings: LauncherSettings) -> Self {
        Self {
            gateway,
            paths,
            settings,
            platform: Platform::current(),
            catalog: LoaderCatalog::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    pub fn catalog(&self) -> &LoaderCatalog {
        &self.catalog
    }

    pub fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    /// Runs every stage for `build` and starts the game.
    /// Any failure clears the session status before it is returned.
    pub async fn launch(
        &self,
        build: &BuildDescriptor,
        session: &LaunchSession,
    ) -> LauncherResult<LaunchHandle> {
        info!(
            "Launch {} for build '{}' ({} {})",
            session.id, build.name, build.game_version, build.loader
        );
        match self.run(build, session).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                error!("Launch {} failed: {}", session.id, e);
                session.status.clear();
                Err(e)
            }
        }
    }

    async fn run(&self, build: &BuildDescriptor, session: &LaunchSession) -> LauncherResult<LaunchHandle> {
        let java_path = self
            .settings
            .java_path
            .clone()
            .ok_or_else(|| LauncherError::ConfigurationMissing("java_path".into()))?;

        let gateway = self.gateway.as_ref();
        let status = &session.status;
        let instance_dir = self.paths.instances.join(&build.dir_name);
        let overlay = Overlay::from(&build.loader);

        session.checkpoint(Stage::Manifest)?;
        status.set("Fetching version data...");
        let manifest = ManifestResolver::new(gateway, &self.paths.versions)
            .resolve(&build.game_version)
            .await?;

        session.checkpoint(Stage::Libraries)?;
        let mut resolution = LibrarySetBuilder::new(gateway, &self.paths.libraries, &self.platform, status)
            .build(&manifest)
            .await?;
        let outcome = overlay
            .apply(&OverlayContext {
                gateway,
                status,
                platform: &self.platform,
                catalog: &self.catalog,
                base: &manifest,
                game_version: &build.game_version,
                loader_version: build.loader_version.as_deref(),
                data_dir: &self.paths.data,
                library_root: &self.paths.libraries,
                instance_dir: &instance_dir,
                java_path: &java_path,
            })
            .await?;
        resolution.libraries.merge_overlay(outcome.libraries);

        session.checkpoint(Stage::Assets)?;
        let assets_dir = AssetSynchronizer::new(gateway, &self.paths.assets, status)
            .sync(&manifest)
            .await?;

        session.checkpoint(Stage::Client)?;
        let placement = ClientPlacement::resolve(
            &self.paths.data,
            &instance_dir,
            &manifest.id,
            overlay.uses_build_local_client(),
        );
        ClientVerifier::new(gateway, status)
            .verify(&manifest, &placement, &mut resolution.libraries)
            .await?;

        session.checkpoint(Stage::Natives)?;
        let natives_dir = unpack_natives(gateway, &resolution.natives, &instance_dir, status).await?;

        session.checkpoint(Stage::Assemble)?;
        let asset_index = manifest
            .asset_index_id()
            .ok_or_else(|| LauncherError::NotFound(format!("asset index for {}", manifest.id)))?;
        let classpath = build_classpath(&resolution.libraries, self.platform.os);
        let profile = OfflineProfile::new(&self.settings.username);

        let command = CommandLine::assemble(&LaunchParams {
            java_path: &java_path,
            memory_mb: self.settings.memory_mb,
            language: &self.settings.language,
            brand: &self.settings.brand,
            classpath: &classpath,
            natives_dir: &natives_dir,
            loader_jvm_args: &outcome.jvm_args,
            module_opens: overlay.needs_module_opens(),
            main_class: &outcome.main_class,
            profile: &profile,
            build_id: &build.id,
            game_dir: &instance_dir,
            assets_dir: &assets_dir,
            asset_index: &asset_index,
            loader_game_args: &outcome.game_args,
            server_address: self.settings.server_address.as_deref(),
        });

        let started = launch::start(
            self.gateway.clone(),
            &command,
            &instance_dir,
            self.platform.os,
            status.clone(),
            session.token(),
        )
        .await?;

        Ok(LaunchHandle {
            command,
            instance_dir,
            started,
        })
    }
}
