// ─── Integrity & Transfer Gateway ───
// The host capability surface the core resolves through. Every suspension
// point of a launch is a call on this trait.

mod local;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::progress::{BatchProgress, StatusSink, TransferObserver};

pub use local::LocalGateway;

/// Source URL → destination path for one batched request.
pub type DownloadBatch = BTreeMap<String, PathBuf>;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// GET a JSON document.
    async fn get_json(&self, url: &str) -> LauncherResult<serde_json::Value>;

    /// Download every entry concurrently. Reports each completed item to
    /// `observer`; fails with a transfer error if any item failed.
    async fn download_many(
        &self,
        batch: DownloadBatch,
        observer: &dyn TransferObserver,
    ) -> LauncherResult<()>;

    /// Stream one large file to `dest`, reporting byte progress.
    async fn large_download(
        &self,
        url: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> LauncherResult<()>;

    async fn exists(&self, path: &Path) -> bool;

    /// Compare the file's content hash against `expected` (hex).
    /// A missing file is reported as `false`.
    async fn hash_matches(&self, path: &Path, expected: &str) -> LauncherResult<bool>;

    /// Recursive directory creation.
    async fn create_dir(&self, path: &Path) -> LauncherResult<()>;

    async fn read_text(&self, path: &Path) -> LauncherResult<String>;

    async fn write_text(&self, path: &Path, contents: &str) -> LauncherResult<()>;

    /// Returns the subset of `relative` paths not present under `root`.
    async fn list_missing(&self, root: &Path, relative: &[String]) -> LauncherResult<Vec<String>>;

    async fn extract_archive(&self, from: &Path, to: &Path) -> LauncherResult<()>;

    async fn write_executable(&self, path: &Path, contents: &str) -> LauncherResult<()>;

    /// Runs a script to completion and reports whether it succeeded.
    async fn run_executable(&self, path: &Path) -> LauncherResult<bool>;
}

/// Existence plus hash check. An empty `sha1` means only presence is known.
pub async fn is_intact(gateway: &dyn Gateway, path: &Path, sha1: &str) -> LauncherResult<bool> {
    if !gateway.exists(path).await {
        return Ok(false);
    }
    if sha1.is_empty() {
        return Ok(true);
    }
    gateway.hash_matches(path, sha1).await
}

/// Issue `batch` as one request with per-item progress under `label`.
/// An empty batch issues nothing.
pub async fn download_pending(
    gateway: &dyn Gateway,
    batch: DownloadBatch,
    label: &'static str,
    status: &StatusSink,
) -> LauncherResult<()> {
    if batch.is_empty() {
        return Ok(());
    }

    info!("{}: requesting {} files", label, batch.len());
    let progress = BatchProgress::new(label, batch.len(), status.clone());
    gateway.download_many(batch, &progress).await
}
