use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// A parsed Maven coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version[:classifier]@packaging`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension / packaging type. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let (coord_part, packaging_override) = match coord.rsplit_once('@') {
            Some((coord, packaging)) => (coord, Some(packaging)),
            None => (coord, None),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            packaging: packaging_override.unwrap_or("jar").to_string(),
        })
    }

    /// Group path portion (`net/sf/jopt-simple`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `artifactId-version[-classifier].packaging`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    fn version_dir(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
    }

    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!(
            "{}/{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Launcher library layout: `artifact-version[-native].jar`.
    ///
    /// The classifier is dropped; native archives for the current platform
    /// are marked with a `-native` suffix instead.
    pub fn library_path(&self, native: bool) -> PathBuf {
        let suffix = if native { "-native" } else { "" };
        self.version_dir().join(format!(
            "{}-{}{}.jar",
            self.artifact_id, self.version, suffix
        ))
    }
}

/// Dedup identity of a library: the second colon-separated segment.
pub fn short_name(coord: &str) -> &str {
    coord.split(':').nth(1).unwrap_or(coord)
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.packaging != "jar" {
            write!(f, "@{}", self.packaging)?;
        }
        Ok(())
    }
}
