// In-memory gateway used by unit tests across the core.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::{DownloadBatch, Gateway};
use crate::core::progress::TransferObserver;

#[derive(Debug, Clone)]
struct MockFile {
    contents: String,
    sha1: Option<String>,
}

#[derive(Default)]
struct State {
    files: BTreeMap<PathBuf, MockFile>,
    documents: BTreeMap<String, serde_json::Value>,
    served_hashes: BTreeMap<String, String>,
    json_requests: Vec<String>,
    batches: Vec<DownloadBatch>,
    large_downloads: Vec<(String, PathBuf)>,
    dirs: BTreeSet<PathBuf>,
    extracted: Vec<(PathBuf, PathBuf)>,
    scripts: BTreeMap<PathBuf, String>,
    runs: Vec<PathBuf>,
    run_succeeds: bool,
    run_creates: Option<(PathBuf, String)>,
    fail_transfers: bool,
}

/// Records every call and simulates a filesystem plus upstreams.
pub struct MockGateway {
    state: Mutex<State>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                run_succeeds: true,
                ..State::default()
            }),
        }
    }

    pub fn put_file(&self, path: impl Into<PathBuf>, contents: &str) {
        self.state.lock().files.insert(
            path.into(),
            MockFile {
                contents: contents.to_string(),
                sha1: None,
            },
        );
    }

    /// A file whose content hash is `sha1`.
    pub fn put_artifact(&self, path: impl Into<PathBuf>, sha1: &str) {
        self.state.lock().files.insert(
            path.into(),
            MockFile {
                contents: String::new(),
                sha1: Some(sha1.to_string()),
            },
        );
    }

    pub fn put_json(&self, url: &str, document: serde_json::Value) {
        self.state.lock().documents.insert(url.to_string(), document);
    }

    /// Files downloaded from `url` will hash to `sha1`.
    pub fn serve_hash(&self, url: &str, sha1: &str) {
        self.state
            .lock()
            .served_hashes
            .insert(url.to_string(), sha1.to_string());
    }

    pub fn fail_transfers(&self) {
        self.state.lock().fail_transfers = true;
    }

    pub fn set_run_result(&self, succeeds: bool) {
        self.state.lock().run_succeeds = succeeds;
    }

    /// Running any executable creates `path`.
    pub fn run_creates(&self, path: impl Into<PathBuf>, contents: &str) {
        self.state.lock().run_creates = Some((path.into(), contents.to_string()));
    }

    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().files.contains_key(path.as_ref())
    }

    pub fn file_text(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state
            .lock()
            .files
            .get(path.as_ref())
            .map(|f| f.contents.clone())
    }

    pub fn json_requests(&self) -> Vec<String> {
        self.state.lock().json_requests.clone()
    }

    pub fn batches(&self) -> Vec<DownloadBatch> {
        self.state.lock().batches.clone()
    }

    pub fn large_downloads(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().large_downloads.clone()
    }

    pub fn extracted(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state.lock().extracted.clone()
    }

    pub fn script(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().scripts.get(path.as_ref()).cloned()
    }

    pub fn runs(&self) -> Vec<PathBuf> {
        self.state.lock().runs.clone()
    }

    fn store_download(state: &mut State, url: &str, dest: &Path) {
        let sha1 = state.served_hashes.get(url).cloned();
        state.files.insert(
            dest.to_path_buf(),
            MockFile {
                contents: String::new(),
                sha1,
            },
        );
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get_json(&self, url: &str) -> LauncherResult<serde_json::Value> {
        let mut state = self.state.lock();
        state.json_requests.push(url.to_string());
        if state.fail_transfers {
            return Err(LauncherError::transfer(format!("unreachable: {}", url)));
        }
        state
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| LauncherError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn download_many(
        &self,
        batch: DownloadBatch,
        observer: &dyn TransferObserver,
    ) -> LauncherResult<()> {
        let fail = {
            let mut state = self.state.lock();
            state.batches.push(batch.clone());
            state.fail_transfers
        };
        if fail {
            return Err(LauncherError::transfer(format!(
                "{} of {} downloads failed",
                batch.len(),
                batch.len()
            )));
        }

        for (url, dest) in &batch {
            Self::store_download(&mut self.state.lock(), url, dest);
            observer.item_completed();
        }
        Ok(())
    }

    async fn large_download(
        &self,
        url: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> LauncherResult<()> {
        {
            let mut state = self.state.lock();
            state.large_downloads.push((url.to_string(), dest.to_path_buf()));
            if state.fail_transfers {
                return Err(LauncherError::transfer(format!("unreachable: {}", url)));
            }
            Self::store_download(&mut state, url, dest);
        }
        observer.bytes_transferred(1024 * 1024, 1024 * 1024);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    async fn hash_matches(&self, path: &Path, expected: &str) -> LauncherResult<bool> {
        Ok(self
            .state
            .lock()
            .files
            .get(path)
            .and_then(|f| f.sha1.as_deref())
            .is_some_and(|sha1| sha1.eq_ignore_ascii_case(expected)))
    }

    async fn create_dir(&self, path: &Path) -> LauncherResult<()> {
        self.state.lock().dirs.insert(path.to_path_buf());
        Ok(())
    }

    async fn read_text(&self, path: &Path) -> LauncherResult<String> {
        self.state
            .lock()
            .files
            .get(path)
            .map(|f| f.contents.clone())
            .ok_or_else(|| {
                LauncherError::io(path, std::io::Error::from(std::io::ErrorKind::NotFound))
            })
    }

    async fn write_text(&self, path: &Path, contents: &str) -> LauncherResult<()> {
        self.put_file(path, contents);
        Ok(())
    }

    async fn list_missing(&self, root: &Path, relative: &[String]) -> LauncherResult<Vec<String>> {
        let state = self.state.lock();
        Ok(relative
            .iter()
            .filter(|rel| !state.files.contains_key(&root.join(rel.as_str())))
            .cloned()
            .collect())
    }

    async fn extract_archive(&self, from: &Path, to: &Path) -> LauncherResult<()> {
        self.state
            .lock()
            .extracted
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    async fn write_executable(&self, path: &Path, contents: &str) -> LauncherResult<()> {
        self.state
            .lock()
            .scripts
            .insert(path.to_path_buf(), contents.to_string());
        self.put_file(path, contents);
        Ok(())
    }

    async fn run_executable(&self, path: &Path) -> LauncherResult<bool> {
        let mut state = self.state.lock();
        state.runs.push(path.to_path_buf());

        if let Some((created, contents)) = state.run_creates.clone() {
            state.files.insert(
                created,
                MockFile {
                    contents,
                    sha1: None,
                },
            );
        }
        Ok(state.run_succeeds)
    }
}
