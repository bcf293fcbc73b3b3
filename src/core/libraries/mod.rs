// ─── Library Set ───
// Ordered classpath entries keyed by short name, plus the integrity check
// shared by every stage that verifies Maven-style artifacts.

mod builder;

use std::path::PathBuf;

use tracing::debug;

use crate::core::error::LauncherResult;
use crate::core::gateway::{is_intact, DownloadBatch, Gateway};

pub use builder::{LibraryResolution, LibrarySetBuilder};

/// Short name used for the game client jar.
pub const CLIENT_ENTRY: &str = "client";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    /// Dedup identity (the artifact id).
    pub name: String,
    pub path: PathBuf,
}

impl ResolvedLibrary {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// At most one entry per short name.
///
/// Inserting a name that is already present replaces the stored path but
/// keeps the position where the name was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySet {
    entries: Vec<ResolvedLibrary>,
}

impl LibrarySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, library: ResolvedLibrary) {
        match self.entries.iter_mut().find(|e| e.name == library.name) {
            Some(existing) => {
                debug!(
                    "Replacing {} ({:?} -> {:?})",
                    existing.name, existing.path, library.path
                );
                existing.path = library.path;
            }
            None => self.entries.push(library),
        }
    }

    /// Overlay entries win over entries already in the set.
    pub fn merge_overlay(&mut self, overlay: impl IntoIterator<Item = ResolvedLibrary>) {
        for library in overlay {
            self.upsert(library);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedLibrary> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedLibrary> {
        self.entries.iter()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }
}

impl FromIterator<ResolvedLibrary> for LibrarySet {
    fn from_iter<I: IntoIterator<Item = ResolvedLibrary>>(iter: I) -> Self {
        let mut set = LibrarySet::new();
        set.merge_overlay(iter);
        set
    }
}

/// A file the launch needs, where it comes from and how to verify it.
#[derive(Debug, Clone)]
pub struct RequiredArtifact {
    pub url: String,
    pub path: PathBuf,
    /// Empty when the upstream publishes no hash.
    pub sha1: String,
}

/// Checks every artifact and returns the batch of those missing or corrupt.
pub async fn collect_missing(
    gateway: &dyn Gateway,
    artifacts: &[RequiredArtifact],
) -> LauncherResult<DownloadBatch> {
    let mut batch = DownloadBatch::new();

    for artifact in artifacts {
        if is_intact(gateway, &artifact.path, &artifact.sha1).await? {
            continue;
        }
        if gateway.exists(&artifact.path).await {
            debug!("{:?} - detected corruption (sha1)", artifact.path);
        }
        batch.insert(artifact.url.clone(), artifact.path.clone());
    }

    Ok(batch)
}
