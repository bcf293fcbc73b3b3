use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// First `java` on the PATH, else `$JAVA_HOME/bin/java`.
pub fn find_system_java() -> Option<PathBuf> {
    if let Some(path) = locate_on_path() {
        info!("Using Java from PATH: {:?}", path);
        return Some(path);
    }

    let home = std::env::var_os("JAVA_HOME")?;
    let candidate = PathBuf::from(home).join("bin").join(java_exe());
    if candidate.is_file() {
        info!("Using Java from JAVA_HOME: {:?}", candidate);
        Some(candidate)
    } else {
        warn!("JAVA_HOME set but {:?} does not exist", candidate);
        None
    }
}

fn locate_on_path() -> Option<PathBuf> {
    let finder = if cfg!(windows) { "where" } else { "which" };
    let output = Command::new(finder).arg("java").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Runs `java -version` and reads the quoted version string.
pub fn probe_java(path: &Path) -> Option<JavaInstallation> {
    let output = Command::new(path).arg("-version").output().ok()?;
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    debug!("Probing {:?}: {}", path, text.lines().next().unwrap_or(""));

    let version = parse_version_string(&text)?;
    Some(JavaInstallation {
        path: path.to_path_buf(),
        major: parse_major_version(&version),
        version,
    })
}

fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let end = line[start + 1..].find('"')?;
        Some(line[start + 1..start + 1 + end].to_string())
    })
}

/// `1.8.0_392` is 8, `17.0.8` is 17.
pub fn parse_major_version(version: &str) -> u32 {
    let mut parts = version.split('.');
    let first: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    if first == 1 {
        parts.next().and_then(|p| p.parse().ok()).unwrap_or(first)
    } else {
        first
    }
}

/// Runtime major the given game release was built for.
pub fn required_java_for_minecraft_version(minecraft_version: &str) -> u32 {
    let mut parts = minecraft_version.split('.');
    let major = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(1);
    let minor = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(20);
    let patch = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);

    if major > 1 || minor >= 21 || (minor == 20 && patch >= 5) {
        21
    } else if minor >= 17 {
        17
    } else {
        8
    }
}
