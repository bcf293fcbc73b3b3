// ─── Library Set Builder ───
// Turns a version manifest into classpath entries and native archives for
// one platform, then fetches whatever is missing in a single batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{collect_missing, LibrarySet, RequiredArtifact, ResolvedLibrary};
use crate::core::error::LauncherResult;
use crate::core::gateway::{download_pending, Gateway};
use crate::core::maven::{short_name, MavenArtifact};
use crate::core::platform::Platform;
use crate::core::progress::StatusSink;
use crate::core::version::{LibDownloadArtifact, LibraryEntry, VersionJson};

pub const LIBRARIES_LABEL: &str = "Libraries downloaded";

#[derive(Debug, Default)]
pub struct LibraryResolution {
    pub libraries: LibrarySet,
    pub natives: Vec<PathBuf>,
}

pub struct LibrarySetBuilder<'a> {
    gateway: &'a dyn Gateway,
    library_root: PathBuf,
    platform: &'a Platform,
    status: &'a StatusSink,
}

/// A native archive picked for this platform.
struct NativeChoice<'m> {
    descriptor: &'m LibDownloadArtifact,
    specificity: u8,
}

impl<'a> LibrarySetBuilder<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        library_root: impl Into<PathBuf>,
        platform: &'a Platform,
        status: &'a StatusSink,
    ) -> Self {
        Self {
            gateway,
            library_root: library_root.into(),
            platform,
            status,
        }
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub async fn build(&self, manifest: &VersionJson) -> LauncherResult<LibraryResolution> {
        self.status.set("Checking Mojang libraries");

        let mut libraries = LibrarySet::new();
        let mut natives: BTreeMap<PathBuf, (u8, RequiredArtifact)> = BTreeMap::new();
        let mut native_order: Vec<PathBuf> = Vec::new();
        let mut required: Vec<RequiredArtifact> = Vec::new();

        for lib in &manifest.libraries {
            let coordinate = MavenArtifact::parse(&lib.name)?;

            if lib.is_native() {
                // Mixed legacy entries also ship a plain jar for the classpath.
                if lib.natives.is_some() && lib.is_allowed_on(self.platform) {
                    if let Some(artifact) = self.plain_artifact(lib) {
                        let path = self.library_root.join(coordinate.library_path(false));
                        libraries.upsert(ResolvedLibrary::new(short_name(&lib.name), &path));
                        required.push(required_artifact(artifact, path));
                    }
                }

                let Some(choice) = self.native_descriptor(lib) else {
                    debug!("Skipping native {} (no archive for this platform)", lib.name);
                    continue;
                };

                let path = self.library_root.join(coordinate.library_path(true));
                let candidate = required_artifact(choice.descriptor, path.clone());
                match natives.get(&path) {
                    Some((held, _)) if *held >= choice.specificity => {}
                    Some(_) => {
                        natives.insert(path, (choice.specificity, candidate));
                    }
                    None => {
                        native_order.push(path.clone());
                        natives.insert(path, (choice.specificity, candidate));
                    }
                }
                continue;
            }

            if !lib.is_allowed_on(self.platform) {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }

            let Some(descriptor) = self.plain_descriptor(lib) else {
                debug!("Skipping library {} (no download descriptor)", lib.name);
                continue;
            };

            let path = self.library_root.join(coordinate.library_path(false));
            libraries.upsert(ResolvedLibrary::new(short_name(&lib.name), &path));
            required.push(required_artifact(descriptor, path));
        }

        required.extend(
            native_order
                .iter()
                .filter_map(|path| natives.get(path))
                .map(|(_, artifact)| artifact.clone()),
        );

        let batch = collect_missing(self.gateway, &required).await?;
        info!(
            "Libraries: {} on classpath, {} natives, {} to download",
            libraries.len(),
            native_order.len(),
            batch.len()
        );
        download_pending(self.gateway, batch, LIBRARIES_LABEL, self.status).await?;

        Ok(LibraryResolution {
            libraries,
            natives: native_order,
        })
    }

    fn plain_artifact<'m>(&self, lib: &'m LibraryEntry) -> Option<&'m LibDownloadArtifact> {
        lib.downloads.as_ref()?.artifact.as_ref()
    }

    /// `downloads.artifact`, else the classifier keyed for this OS family.
    fn plain_descriptor<'m>(&self, lib: &'m LibraryEntry) -> Option<&'m LibDownloadArtifact> {
        let downloads = lib.downloads.as_ref()?;
        if let Some(artifact) = &downloads.artifact {
            return Some(artifact);
        }

        downloads
            .classifiers
            .as_ref()?
            .iter()
            .find(|(key, _)| self.platform.os.matches_key(key))
            .map(|(_, descriptor)| descriptor)
    }

    /// The archive this platform should extract, if any passes the filter.
    fn native_descriptor<'m>(&self, lib: &'m LibraryEntry) -> Option<NativeChoice<'m>> {
        let downloads = lib.downloads.as_ref()?;
        let accept = |descriptor: &'m LibDownloadArtifact| {
            let path = descriptor.path.as_deref()?;
            self.platform
                .native_specificity(path)
                .map(|specificity| NativeChoice {
                    descriptor,
                    specificity,
                })
        };

        if lib.natives.is_none() {
            if let Some(artifact) = &downloads.artifact {
                return accept(artifact);
            }
        }

        let classifiers = downloads.classifiers.as_ref()?;

        let declared = lib
            .natives
            .as_ref()
            .and_then(|natives| natives.get(self.platform.os.rule_name()))
            .map(|key| key.replace("${arch}", self.platform.arch.bits()));
        if let Some(choice) = declared
            .and_then(|key| classifiers.get(&key))
            .and_then(accept)
        {
            return Some(choice);
        }

        classifiers
            .iter()
            .filter(|(key, _)| self.platform.os.matches_key(key))
            .filter_map(|(_, descriptor)| accept(descriptor))
            .max_by_key(|choice| choice.specificity)
    }
}

fn required_artifact(descriptor: &LibDownloadArtifact, path: PathBuf) -> RequiredArtifact {
    RequiredArtifact {
        url: descriptor.url.clone(),
        path,
        sha1: descriptor.sha1.clone(),
    }
}
