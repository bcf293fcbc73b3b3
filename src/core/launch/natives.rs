use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::gateway::Gateway;
use crate::core::progress::StatusSink;

pub fn natives_dir(instance_dir: &Path) -> PathBuf {
    instance_dir.join("natives")
}

/// Unpack every native archive into `<instance>/natives`, in order.
pub async fn unpack_natives(
    gateway: &dyn Gateway,
    natives: &[PathBuf],
    instance_dir: &Path,
    status: &StatusSink,
) -> LauncherResult<PathBuf> {
    let dir = natives_dir(instance_dir);
    gateway.create_dir(&dir).await?;

    for (i, archive) in natives.iter().enumerate() {
        status.set(format!("Unpacking {}/{}", i + 1, natives.len()));
        gateway.extract_archive(archive, &dir).await?;
    }

    info!("Unpacked {} native archives into {:?}", natives.len(), dir);
    Ok(dir)
}
