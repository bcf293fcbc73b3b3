use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::{DownloadBatch, Gateway};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::progress::TransferObserver;

const DEFAULT_CONCURRENCY: usize = 8;

/// Gateway backed by the local filesystem, `reqwest` and child processes.
pub struct LocalGateway {
    client: Client,
    /// Maximum number of parallel downloads in one batch.
    concurrency: usize,
}

impl LocalGateway {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    async fn ensure_parent(dest: &Path) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        Ok(())
    }

    async fn get_checked(&self, url: &str) -> LauncherResult<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Download a single file to `dest`, creating parent directories.
    async fn fetch_to(&self, url: &str, dest: &Path) -> LauncherResult<()> {
        Self::ensure_parent(dest).await?;

        let bytes = self.get_checked(url).await?.bytes().await?;

        // Scope the handle so it is closed before the next item touches the dir.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            file.write_all(&bytes)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            file.flush().await.map_err(|e| LauncherError::io(dest, e))?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }
}

fn digest_hex(bytes: &[u8], expected_len: usize) -> Option<String> {
    match expected_len {
        40 => Some(hex::encode(Sha1::digest(bytes))),
        64 => Some(hex::encode(Sha256::digest(bytes))),
        _ => None,
    }
}

fn join_error(e: tokio::task::JoinError) -> LauncherError {
    LauncherError::Other(format!("Task join error: {}", e))
}

fn extract_zip(from: &Path, to: &Path) -> LauncherResult<()> {
    let file = std::fs::File::open(from).map_err(|e| LauncherError::io(from, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry {:?} in {:?}", entry.name(), from);
            continue;
        };
        let out_path = to.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = std::fs::File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;
    }

    Ok(())
}

fn extract_tar_gz(from: &Path, to: &Path) -> LauncherResult<()> {
    let file = std::fs::File::open(from).map_err(|e| LauncherError::io(from, e))?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    archive.unpack(to).map_err(|e| LauncherError::io(to, e))
}

#[cfg(unix)]
fn script_command(path: &Path) -> tokio::process::Command {
    let mut command = tokio::process::Command::new("bash");
    command.arg(path);
    command
}

#[cfg(windows)]
fn script_command(path: &Path) -> tokio::process::Command {
    const CREATE_NO_WINDOW: u32 = 0x08000000;
    let mut command = tokio::process::Command::new(path);
    command.creation_flags(CREATE_NO_WINDOW);
    command
}

/// Runs a script, forwarding its stdout line by line into the log.
async fn run_script(path: &Path, dir: &Path) -> std::io::Result<std::process::ExitStatus> {
    let mut child = script_command(path)
        .current_dir(dir)
        .stdout(std::process::Stdio::piped())
        .spawn()?;

    if let Some(stdout) = child.stdout.take() {
        let mut reader = tokio::io::BufReader::new(stdout);
        let mut line = Vec::new();
        while reader.read_until(b'\n', &mut line).await? > 0 {
            let text = String::from_utf8_lossy(&line);
            debug!(target: "burrow_lib::script", "{}", text.trim_end());
            line.clear();
        }
    }

    child.wait().await
}

#[async_trait]
impl Gateway for LocalGateway {
    async fn get_json(&self, url: &str) -> LauncherResult<serde_json::Value> {
        let response = self.get_checked(url).await?;
        Ok(response.json().await?)
    }

    async fn download_many(
        &self,
        batch: DownloadBatch,
        observer: &dyn TransferObserver,
    ) -> LauncherResult<()> {
        let total = batch.len();
        info!(
            "Starting batch download: {} files, concurrency={}",
            total, self.concurrency
        );

        let failures: Vec<(String, LauncherError)> = stream::iter(batch)
            .map(|(url, dest)| async move {
                let result = self.fetch_to(&url, &dest).await;
                if result.is_ok() {
                    observer.item_completed();
                }
                (url, result)
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|(url, result)| async move { result.err().map(|e| (url, e)) })
            .collect()
            .await;

        if let Some((url, first)) = failures.first() {
            for (failed_url, error) in &failures {
                warn!("Download failed: {} ({})", failed_url, error);
            }
            return Err(LauncherError::transfer(format!(
                "{} of {} downloads failed; first: {}: {}",
                failures.len(),
                total,
                url,
                first
            )));
        }

        Ok(())
    }

    async fn large_download(
        &self,
        url: &str,
        dest: &Path,
        observer: &dyn TransferObserver,
    ) -> LauncherResult<()> {
        Self::ensure_parent(dest).await?;

        let response = self.get_checked(url).await?;
        let total = response.content_length().unwrap_or(0);
        let mut body = response.bytes_stream();

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            downloaded += chunk.len() as u64;
            if total > 0 {
                downloaded = downloaded.min(total);
            }
            observer.bytes_transferred(downloaded, total);
        }
        file.flush().await.map_err(|e| LauncherError::io(dest, e))?;

        info!("Downloaded {} bytes: {} -> {:?}", downloaded, url, dest);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn hash_matches(&self, path: &Path, expected: &str) -> LauncherResult<bool> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(LauncherError::io(path, e)),
        };

        let expected = expected.trim();
        let Some(actual) = digest_hex(&bytes, expected.len()) else {
            warn!("Unrecognised hash length {} for {:?}", expected.len(), path);
            return Ok(false);
        };
        Ok(actual.eq_ignore_ascii_case(expected))
    }

    async fn create_dir(&self, path: &Path) -> LauncherResult<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }

    async fn read_text(&self, path: &Path) -> LauncherResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }

    async fn write_text(&self, path: &Path, contents: &str) -> LauncherResult<()> {
        Self::ensure_parent(path).await?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| LauncherError::io(path, e))
    }

    async fn list_missing(&self, root: &Path, relative: &[String]) -> LauncherResult<Vec<String>> {
        let root = root.to_path_buf();
        let relative = relative.to_vec();

        tokio::task::spawn_blocking(move || {
            relative
                .into_iter()
                .filter(|rel| std::fs::metadata(root.join(rel)).is_err())
                .collect()
        })
        .await
        .map_err(join_error)
    }

    async fn extract_archive(&self, from: &Path, to: &Path) -> LauncherResult<()> {
        let from = from.to_path_buf();
        let to = to.to_path_buf();

        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&to).map_err(|e| LauncherError::io(&to, e))?;
            let name = from.to_string_lossy().to_lowercase();
            if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
                extract_tar_gz(&from, &to)
            } else {
                extract_zip(&from, &to)
            }
        })
        .await
        .map_err(join_error)?
    }

    async fn write_executable(&self, path: &Path, contents: &str) -> LauncherResult<()> {
        self.write_text(path, contents).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| LauncherError::io(path, e))?;
        }

        Ok(())
    }

    async fn run_executable(&self, path: &Path) -> LauncherResult<bool> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        match run_script(path, dir).await {
            Ok(status) => {
                if !status.success() {
                    warn!("{:?} exited with {:?}", path, status.code());
                }
                Ok(status.success())
            }
            Err(e) => {
                warn!("Failed to start {:?}: {}", path, e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::Silent;
    use std::io::Write;

    fn gateway() -> LocalGateway {
        LocalGateway::new().unwrap()
    }

    #[tokio::test]
    async fn hash_matches_sha1_and_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let gw = gateway();
        assert!(gw
            .hash_matches(&path, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")
            .await
            .unwrap());
        assert!(gw
            .hash_matches(
                &path,
                "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
            )
            .await
            .unwrap());
        assert!(!gw
            .hash_matches(&path, "0000000000000000000000000000000000000000")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn hash_of_missing_file_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway();
        assert!(!gw
            .hash_matches(&dir.path().join("nope"), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn list_missing_reports_absent_objects_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ab")).unwrap();
        std::fs::write(dir.path().join("ab/abcdef"), b"x").unwrap();

        let missing = gateway()
            .list_missing(dir.path(), &["ab/abcdef".into(), "cd/cdef01".into()])
            .await
            .unwrap();

        assert_eq!(missing, vec!["cd/cdef01".to_string()]);
    }

    #[tokio::test]
    async fn extract_zip_archive_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("natives.jar");
        {
            let file = std::fs::File::create(&archive_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("liblwjgl.so", options).unwrap();
            zip.write_all(b"elf").unwrap();
            zip.finish().unwrap();
        }

        let out = dir.path().join("natives");
        gateway().extract_archive(&archive_path, &out).await.unwrap();

        assert_eq!(std::fs::read(out.join("liblwjgl.so")).unwrap(), b"elf");
    }

    #[tokio::test]
    async fn empty_batch_completes_without_network() {
        gateway()
            .download_many(DownloadBatch::new(), &Silent)
            .await
            .unwrap();
    }

    /// Serves `body` with status 200 to every request on a loopback port.
    async fn serve_body(body: &'static [u8]) -> String {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = [0u8; 1024];
                    let _ = socket.read(&mut request).await;
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    struct Counter(std::sync::atomic::AtomicUsize);

    impl TransferObserver for Counter {
        fn item_completed(&self) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn single_slot_batch_downloads_every_item() {
        let base = serve_body(b"jar-bytes").await;
        let dir = tempfile::tempdir().unwrap();

        let mut batch = DownloadBatch::new();
        for name in ["a.jar", "b.jar", "c.jar"] {
            batch.insert(format!("{}/{}", base, name), dir.path().join("libs").join(name));
        }

        let counter = Counter(std::sync::atomic::AtomicUsize::new(0));
        gateway()
            .with_concurrency(1)
            .download_many(batch, &counter)
            .await
            .unwrap();

        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 3);
        for name in ["a.jar", "b.jar", "c.jar"] {
            assert_eq!(std::fs::read(dir.path().join("libs").join(name)).unwrap(), b"jar-bytes");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn long_script_output_is_drained_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let noisy = dir.path().join("noisy.sh");

        let gw = gateway();
        gw.write_executable(&noisy, "for i in $(seq 1 20000); do echo \"line $i\"; done\nexit 0\n")
            .await
            .unwrap();

        assert!(gw.run_executable(&noisy).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_executable_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.sh");
        let bad = dir.path().join("bad.sh");

        let gw = gateway();
        gw.write_executable(&ok, "exit 0\n").await.unwrap();
        gw.write_executable(&bad, "exit 3\n").await.unwrap();

        assert!(gw.run_executable(&ok).await.unwrap());
        assert!(!gw.run_executable(&bad).await.unwrap());
    }
}
