// ─── Launch Task ───
// Writes the two launch scripts and starts the game through the gateway.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::error::LauncherResult;
use crate::core::gateway::Gateway;
use crate::core::platform::OsFamily;
use crate::core::progress::StatusSink;

use super::command::CommandLine;

/// How long "Launching build..." stays up after the game was started.
pub const STATUS_WATCHDOG: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchScripts {
    pub start: PathBuf,
    pub debug: PathBuf,
}

impl LaunchScripts {
    pub fn in_dir(instance_dir: &Path, os: OsFamily) -> Self {
        let ext = os.script_extension();
        Self {
            start: instance_dir.join(format!("start.{}", ext)),
            debug: instance_dir.join(format!("startWithLogs.{}", ext)),
        }
    }
}

/// The running game and the status watchdog.
#[derive(Debug)]
pub struct Started {
    pub scripts: LaunchScripts,
    /// Resolves when the game exits, with its success flag.
    pub process: JoinHandle<LauncherResult<bool>>,
    pub watchdog: JoinHandle<()>,
}

pub async fn write_scripts(
    gateway: &dyn Gateway,
    command: &CommandLine,
    instance_dir: &Path,
    os: OsFamily,
) -> LauncherResult<LaunchScripts> {
    gateway.create_dir(instance_dir).await?;

    let scripts = LaunchScripts::in_dir(instance_dir, os);
    gateway
        .write_executable(&scripts.start, &os.script(&command.render()))
        .await?;
    gateway
        .write_executable(&scripts.debug, &os.script(&command.render_debug(os)))
        .await?;
    Ok(scripts)
}

/// Write both scripts, run `start` in the background and arm the watchdog.
pub async fn start(
    gateway: Arc<dyn Gateway>,
    command: &CommandLine,
    instance_dir: &Path,
    os: OsFamily,
    status: StatusSink,
    cancel: CancellationToken,
) -> LauncherResult<Started> {
    let scripts = write_scripts(gateway.as_ref(), command, instance_dir, os).await?;
    info!("Starting {:?}", scripts.start);

    let script = scripts.start.clone();
    let process = tokio::spawn(async move {
        let result = gateway.run_executable(&script).await;
        match &result {
            Ok(true) => info!("Game exited normally"),
            Ok(false) => error!("Game exited with a failure status"),
            Err(e) => error!("Could not run {:?}: {}", script, e),
        }
        result
    });

    status.set("Launching build...");
    let watchdog = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(STATUS_WATCHDOG) => {}
            _ = cancel.cancelled() => {}
        }
        status.clear();
    });

    Ok(Started {
        scripts,
        process,
        watchdog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::OfflineProfile;
    use crate::core::launch::command::LaunchParams;
    use crate::core::testing::MockGateway;

    fn command(profile: &OfflineProfile) -> CommandLine {
        CommandLine::assemble(&LaunchParams {
            java_path: Path::new("/usr/bin/java"),
            memory_mb: 1024,
            language: "en",
            brand: "Burrow",
            classpath: "/a.jar:/b.jar",
            natives_dir: Path::new("/i/natives"),
            loader_jvm_args: &[],
            module_opens: false,
            main_class: "net.minecraft.client.main.Main",
            profile,
            build_id: "b",
            game_dir: Path::new("/i"),
            assets_dir: Path::new("/data/assets"),
            asset_index: "5",
            loader_game_args: &[],
            server_address: None,
        })
    }

    #[tokio::test]
    async fn both_scripts_are_written_with_headers() {
        let gw = MockGateway::new();
        let profile = OfflineProfile::new("Steve");
        let scripts = write_scripts(&gw, &command(&profile), Path::new("/i"), OsFamily::Linux)
            .await
            .unwrap();

        assert_eq!(scripts.start, PathBuf::from("/i/start.sh"));
        let start = gw.script("/i/start.sh").unwrap();
        let debug = gw.script("/i/startWithLogs.sh").unwrap();
        assert!(start.starts_with("#!/usr/bin/env bash\n\"/usr/bin/java\" "));
        assert!(debug.contains("read -r -p"));
        assert!(!start.contains("read -r -p"));
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_clears_status_after_timeout() {
        let gw = Arc::new(MockGateway::new());
        let status = StatusSink::new();
        let profile = OfflineProfile::new("Steve");

        let started = start(
            gw.clone(),
            &command(&profile),
            Path::new("/i"),
            OsFamily::Windows,
            status.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(started.process.await.unwrap().unwrap());
        assert_eq!(gw.runs(), vec![PathBuf::from("/i/start.bat")]);
        assert_eq!(status.current().as_deref(), Some("Launching build..."));

        tokio::time::advance(STATUS_WATCHDOG + Duration::from_millis(1)).await;
        started.watchdog.await.unwrap();
        assert_eq!(status.current(), None);
    }
}
