use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every stage returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Transfer failed: {0}")]
    Transfer(String),

    // ── Resolution ──────────────────────────────────────
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Integrity ───────────────────────────────────────
    #[error("Hash mismatch for {path:?}: expected {expected}")]
    IntegrityMismatch { path: PathBuf, expected: String },

    // ── Loader ──────────────────────────────────────────
    #[error("Loader installation failed: {0}")]
    InstallFailure(String),

    // ── Configuration ───────────────────────────────────
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    // ── Session ─────────────────────────────────────────
    #[error("Launch session {0} was cancelled")]
    Cancelled(uuid::Uuid),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    pub fn transfer(message: impl Into<String>) -> Self {
        LauncherError::Transfer(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Network-class failures: anything the upstream or the wire caused.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            LauncherError::Transfer(_) | LauncherError::Http(_) | LauncherError::DownloadFailed { .. }
        )
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_class_covers_wire_errors_only() {
        assert!(LauncherError::transfer("boom").is_transfer());
        assert!(LauncherError::DownloadFailed {
            url: "https://example.com".into(),
            status: 404
        }
        .is_transfer());
        assert!(!LauncherError::NotFound("1.99".into()).is_transfer());
        assert!(!LauncherError::InstallFailure("exit 1".into()).is_transfer());
    }
}
