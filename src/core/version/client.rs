// ─── Client Artifact ───
// Ensures the game client jar is present and hash-valid.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::version_file::VersionJson;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::{is_intact, Gateway};
use crate::core::libraries::{LibrarySet, ResolvedLibrary, CLIENT_ENTRY};
use crate::core::progress::{ByteProgress, StatusSink};

pub const CLIENT_LABEL: &str = "Game downloaded";

/// Where the client jar lives for one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPlacement {
    /// `<data>/versions/<id>/<id>.jar`, shared by every build.
    Shared(PathBuf),
    /// `<instance>/forge/versions/<id>/<id>.jar`. The installer patches this
    /// copy and supplies its own classpath entry for it.
    BuildLocal(PathBuf),
}

impl ClientPlacement {
    pub fn resolve(data_dir: &Path, instance_dir: &Path, version_id: &str, build_local: bool) -> Self {
        let file = format!("{}.jar", version_id);
        if build_local {
            ClientPlacement::BuildLocal(
                instance_dir
                    .join("forge")
                    .join("versions")
                    .join(version_id)
                    .join(file),
            )
        } else {
            ClientPlacement::Shared(data_dir.join("versions").join(version_id).join(file))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ClientPlacement::Shared(path) | ClientPlacement::BuildLocal(path) => path,
        }
    }

    fn on_classpath(&self) -> bool {
        matches!(self, ClientPlacement::Shared(_))
    }
}

pub struct ClientVerifier<'a> {
    gateway: &'a dyn Gateway,
    status: &'a StatusSink,
}

impl<'a> ClientVerifier<'a> {
    pub fn new(gateway: &'a dyn Gateway, status: &'a StatusSink) -> Self {
        Self { gateway, status }
    }

    /// Verifies (or fetches) the client jar and, for shared placement,
    /// appends it to `libraries` exactly once.
    pub async fn verify(
        &self,
        manifest: &VersionJson,
        placement: &ClientPlacement,
        libraries: &mut LibrarySet,
    ) -> LauncherResult<PathBuf> {
        let client = manifest.client_download()?;
        let path = placement.path();

        if is_intact(self.gateway, path, &client.sha1).await? {
            info!("Client jar {:?} verified", path);
        } else {
            if self.gateway.exists(path).await {
                warn!("Client jar {:?} is corrupted, downloading again", path);
            } else if let Some(dir) = path.parent() {
                self.gateway.create_dir(dir).await?;
            }

            let progress = ByteProgress::new(CLIENT_LABEL, self.status.clone());
            self.gateway
                .large_download(&client.url, path, &progress)
                .await?;

            if !is_intact(self.gateway, path, &client.sha1).await? {
                return Err(LauncherError::IntegrityMismatch {
                    path: path.to_path_buf(),
                    expected: client.sha1.clone(),
                });
            }
        }

        if placement.on_classpath() {
            libraries.upsert(ResolvedLibrary::new(CLIENT_ENTRY, path));
        }
        Ok(path.to_path_buf())
    }
}
