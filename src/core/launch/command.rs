// ─── Command Line ───
// The full game invocation: runtime, JVM flags, main class, game arguments.

use std::path::{Path, PathBuf};

use crate::core::auth::{OfflineProfile, OFFLINE_ACCESS_TOKEN};
use crate::core::platform::OsFamily;

use super::classpath::escape_spaces;

/// Fixed GC tuning passed to every launch.
const BASELINE_JVM_FLAGS: &[&str] = &[
    "-XX:HeapDumpPath=MojangTricksIntelDriversForPerformance_javaw.exe_minecraft.exe.heapdump",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+UseG1GC",
    "-XX:G1NewSizePercent=20",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapRegionSize=32M",
    "-Djava.net.preferIPv4Stack=true",
];

/// Reflective access the Forge runtime needs on modular JVMs.
const MODULE_OPENS: &[&str] = &[
    "java.base/java.util.jar=ALL-UNNAMED",
    "java.base/java.lang=ALL-UNNAMED",
    "java.base/java.util=ALL-UNNAMED",
    "java.base/java.lang.reflect=ALL-UNNAMED",
    "java.base/java.text=ALL-UNNAMED",
    "java.base/java.util.concurrent=ALL-UNNAMED",
    "java.base/java.io=ALL-UNNAMED",
    "java.base/java.nio=ALL-UNNAMED",
    "java.base/jdk.internal.loader=ALL-UNNAMED",
    "java.base/jdk.internal.module=ALL-UNNAMED",
    "java.base/java.lang.invoke=ALL-UNNAMED",
];

/// Everything that goes into one invocation.
pub struct LaunchParams<'a> {
    pub java_path: &'a Path,
    pub memory_mb: u32,
    pub language: &'a str,
    pub brand: &'a str,
    /// Already joined with the platform separator.
    pub classpath: &'a str,
    pub natives_dir: &'a Path,
    pub loader_jvm_args: &'a [String],
    pub module_opens: bool,
    pub main_class: &'a str,
    pub profile: &'a OfflineProfile,
    pub build_id: &'a str,
    pub game_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub asset_index: &'a str,
    pub loader_game_args: &'a [String],
    pub server_address: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub runtime: PathBuf,
    /// Already quoted where the script needs quotes.
    pub args: Vec<String>,
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

impl CommandLine {
    pub fn assemble(params: &LaunchParams<'_>) -> Self {
        let mut args: Vec<String> = BASELINE_JVM_FLAGS.iter().map(|f| f.to_string()).collect();

        args.push(format!("-Xmx{}M", params.memory_mb));
        args.push(format!("-Duser.language={}", params.language));
        args.push(format!("-Dminecraft.launcher.brand=\"{}\"", params.brand));
        args.push("-cp".into());
        args.push(format!("\"{}\"", escape_spaces(params.classpath)));
        args.push(format!("-Djava.library.path={}", quoted(params.natives_dir)));

        args.extend(params.loader_jvm_args.iter().cloned());
        if params.module_opens {
            for open in MODULE_OPENS {
                args.push("--add-opens".into());
                args.push(open.to_string());
            }
        }

        args.push(params.main_class.to_string());
        args.extend([
            "--username".into(),
            params.profile.username.clone(),
            "--version".into(),
            params.build_id.to_string(),
            "--gameDir".into(),
            quoted(params.game_dir),
            "--assetsDir".into(),
            quoted(params.assets_dir),
            "--assetIndex".into(),
            format!("\"{}\"", params.asset_index),
            "--uuid".into(),
            params.profile.uuid.clone(),
            "--accessToken".into(),
            OFFLINE_ACCESS_TOKEN.into(),
            "--userProperties".into(),
            "{}".into(),
        ]);
        args.extend(params.loader_game_args.iter().cloned());

        if let Some(server) = params.server_address.filter(|s| !s.trim().is_empty()) {
            args.push("--quickPlayMultiplayer".into());
            args.push(server.to_string());
        }

        Self {
            runtime: params.java_path.to_path_buf(),
            args,
        }
    }

    /// Single shell line running the game.
    pub fn render(&self) -> String {
        format!("\"{}\" {}", self.runtime.display(), self.args.join(" "))
    }

    /// Console runtime instead of the windowed one, pausing on exit.
    pub fn render_debug(&self, os: OsFamily) -> String {
        let runtime = self.runtime.display().to_string().replace("javaw.exe", "java.exe");
        let pause = match os {
            OsFamily::Windows => "pause",
            OsFamily::Linux | OsFamily::MacOs => "read -r -p \"Press enter to close...\" _",
        };
        format!("\"{}\" {}\n{}", runtime, self.args.join(" "), pause)
    }
}
