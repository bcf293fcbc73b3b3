use std::path::Path;

use tracing::{info, warn};

use super::catalog::{FabricComponent, FabricLibrary, FabricLoaderRelease};
use super::{OverlayContext, OverlayOutcome};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::download_pending;
use crate::core::libraries::{collect_missing, RequiredArtifact, ResolvedLibrary};
use crate::core::maven::{MavenArtifact, FABRIC_MAVEN};

pub const KNOT_CLIENT: &str = "net.fabricmc.loader.impl.launch.knot.KnotClient";
const FABRIC_LABEL: &str = "Fabric libraries downloaded";

/// Pinned release if the catalog has it, else the newest one.
fn select_release<'r>(
    releases: &'r [FabricLoaderRelease],
    pinned: Option<&str>,
) -> Option<&'r FabricLoaderRelease> {
    if let Some(pin) = pinned {
        match releases.iter().find(|r| r.loader.version == pin) {
            Some(release) => return Some(release),
            None => warn!("Fabric loader {} not listed, using newest", pin),
        }
    }
    releases.first()
}

/// Common libraries, then intermediary mappings, then the loader itself.
fn components(release: &FabricLoaderRelease) -> Vec<FabricLibrary> {
    let component = |c: &FabricComponent| FabricLibrary {
        name: c.maven.clone(),
        url: None,
        sha1: None,
        size: None,
    };

    let mut libs = release.launcher_meta.libraries.common.clone();
    libs.push(component(&release.intermediary));
    libs.push(component(&release.loader));
    libs
}

fn required(lib: &FabricLibrary, library_root: &Path) -> LauncherResult<(ResolvedLibrary, RequiredArtifact)> {
    let artifact = MavenArtifact::parse(&lib.name)?;
    let path = library_root.join(artifact.library_path(false));
    let repo = lib.url.as_deref().unwrap_or(FABRIC_MAVEN);

    Ok((
        ResolvedLibrary::new(artifact.artifact_id.clone(), &path),
        RequiredArtifact {
            url: artifact.url(repo),
            path,
            sha1: lib.sha1.clone().unwrap_or_default(),
        },
    ))
}

pub(super) async fn apply(ctx: &OverlayContext<'_>) -> LauncherResult<OverlayOutcome> {
    ctx.status.set("Checking Fabric libraries");

    let releases = ctx.catalog.fabric_releases(ctx.gateway, ctx.game_version).await?;
    let release = select_release(&releases, ctx.loader_version).ok_or_else(|| {
        LauncherError::NotFound(format!("Fabric loader for {}", ctx.game_version))
    })?;
    info!(
        "Fabric loader {} (intermediary {})",
        release.loader.version, release.intermediary.version
    );

    let mut libraries = Vec::new();
    let mut artifacts = Vec::new();
    for lib in components(release) {
        let (library, artifact) = required(&lib, ctx.library_root)?;
        libraries.push(library);
        artifacts.push(artifact);
    }

    let batch = collect_missing(ctx.gateway, &artifacts).await?;
    download_pending(ctx.gateway, batch, FABRIC_LABEL, ctx.status).await?;

    Ok(OverlayOutcome {
        libraries,
        main_class: KNOT_CLIENT.to_string(),
        jvm_args: Vec::new(),
        game_args: Vec::new(),
    })
}
