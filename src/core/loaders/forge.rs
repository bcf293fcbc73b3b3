use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{OverlayContext, OverlayOutcome};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::gateway::{download_pending, DownloadBatch};
use crate::core::libraries::ResolvedLibrary;
use crate::core::maven::{short_name, MavenArtifact, FORGE_MAVEN};
use crate::core::version::{read_version, VersionJson};

const INSTALLER_LABEL: &str = "Forge installer downloaded";

/// Contents of the `launcher_profiles.json` the installer insists on.
const DUMMY_PROFILES: &str = r#"{"profiles":{},"settings":{"crashAssistance":true,"enableAdvanced":true},"launcherVersion":{"name":"0.0.0","format":21}}"#;

/// `<mc>-forge-<forge>`, the id the installer gives the patched version.
pub fn forge_version_id(game_version: &str, forge_version: &str) -> String {
    format!("{}-forge-{}", game_version, forge_version)
}

/// Files a Forge install owns inside one build directory.
#[derive(Debug, Clone)]
pub struct ForgeLayout {
    /// `<instance>/forge`, the installer's target directory.
    pub root: PathBuf,
    pub version_id: String,
    pub game_version: String,
    pub forge_version: String,
}

impl ForgeLayout {
    pub fn new(instance_dir: &Path, game_version: &str, forge_version: &str) -> Self {
        Self {
            root: instance_dir.join("forge"),
            version_id: forge_version_id(game_version, forge_version),
            game_version: game_version.to_string(),
            forge_version: forge_version.to_string(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root
            .join("versions")
            .join(&self.version_id)
            .join(format!("{}.json", self.version_id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.root.join("launcher_profiles.json")
    }

    fn installer_name(&self) -> String {
        format!("forge-{}-{}-installer.jar", self.game_version, self.forge_version)
    }

    pub fn installer_url(&self) -> String {
        format!(
            "{}/net/minecraftforge/forge/{}-{}/{}",
            FORGE_MAVEN,
            self.game_version,
            self.forge_version,
            self.installer_name()
        )
    }
}

/// Progress of a Forge install for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeInstallState {
    NoLocalManifest,
    DownloadingInstaller,
    Installing,
    Installed,
}

struct ForgeInstaller<'c, 'a> {
    ctx: &'c OverlayContext<'a>,
    layout: &'c ForgeLayout,
    cache_dir: PathBuf,
}

impl ForgeInstaller<'_, '_> {
    fn installer_path(&self) -> PathBuf {
        self.cache_dir.join(self.layout.installer_name())
    }

    fn script_path(&self) -> PathBuf {
        self.cache_dir.join(format!(
            "install_forge.{}",
            self.ctx.platform.os.script_extension()
        ))
    }

    async fn initial_state(&self) -> ForgeInstallState {
        if self.ctx.gateway.exists(&self.layout.manifest_path()).await {
            ForgeInstallState::Installed
        } else {
            ForgeInstallState::NoLocalManifest
        }
    }

    async fn advance(&self, state: ForgeInstallState) -> LauncherResult<ForgeInstallState> {
        let gateway = self.ctx.gateway;

        match state {
            ForgeInstallState::NoLocalManifest => {
                gateway.create_dir(&self.cache_dir).await?;
                Ok(ForgeInstallState::DownloadingInstaller)
            }
            ForgeInstallState::DownloadingInstaller => {
                self.ctx.status.set("Downloading Forge installer...");
                let mut batch = DownloadBatch::new();
                batch.insert(self.layout.installer_url(), self.installer_path());
                download_pending(gateway, batch, INSTALLER_LABEL, self.ctx.status).await?;
                Ok(ForgeInstallState::Installing)
            }
            ForgeInstallState::Installing => {
                self.ctx.status.set("Running Forge installer...");
                let command = format!(
                    "\"{}\" -jar \"{}\" --installClient \"{}\"",
                    self.ctx.java_path.display(),
                    self.installer_path().display(),
                    self.layout.root.display()
                );
                let script = self.script_path();
                gateway
                    .write_executable(&script, &self.ctx.platform.os.script(&command))
                    .await?;

                if !gateway.run_executable(&script).await? {
                    return Err(LauncherError::InstallFailure(format!(
                        "Forge installer exited with an error, see logs in {:?}",
                        self.layout.root
                    )));
                }
                if !gateway.exists(&self.layout.manifest_path()).await {
                    return Err(LauncherError::InstallFailure(format!(
                        "Forge installer finished but {:?} is missing",
                        self.layout.manifest_path()
                    )));
                }
                Ok(ForgeInstallState::Installed)
            }
            ForgeInstallState::Installed => Ok(ForgeInstallState::Installed),
        }
    }

    async fn run(&self) -> LauncherResult<()> {
        let mut state = self.initial_state().await;
        while state != ForgeInstallState::Installed {
            let next = self.advance(state).await?;
            debug!("Forge install {:?} -> {:?}", state, next);
            state = next;
        }
        Ok(())
    }
}

/// Expands the installer's placeholders in JVM arguments and quotes the
/// module path that follows `-p`.
pub fn substitute_jvm_args(
    args: Vec<String>,
    library_dir: &str,
    separator: &str,
    version_name: &str,
) -> Vec<String> {
    let mut args: Vec<String> = args
        .into_iter()
        .map(|arg| {
            arg.replace("${library_directory}", library_dir)
                .replace("${classpath_separator}", separator)
                .replace("${version_name}", version_name)
        })
        .collect();

    if let Some(idx) = args.iter().position(|arg| arg == "-p") {
        if let Some(module_path) = args.get_mut(idx + 1) {
            *module_path = format!("\"{}\"", module_path);
        }
    }
    args
}

fn forge_libraries(manifest: &VersionJson, layout: &ForgeLayout, ctx: &OverlayContext<'_>) -> LauncherResult<Vec<ResolvedLibrary>> {
    let libraries_dir = layout.libraries_dir();
    let mut resolved = Vec::new();

    for lib in &manifest.libraries {
        if !lib.is_allowed_on(ctx.platform) {
            debug!("Skipping Forge library (OS rule): {}", lib.name);
            continue;
        }

        let declared = lib
            .downloads
            .as_ref()
            .and_then(|d| d.artifact.as_ref())
            .and_then(|a| a.path.as_deref());

        let path = match declared {
            Some(relative) => libraries_dir.join(relative),
            None => libraries_dir.join(MavenArtifact::parse(&lib.name)?.library_path(false)),
        };
        resolved.push(ResolvedLibrary::new(short_name(&lib.name), path));
    }

    Ok(resolved)
}

async fn resolve_forge_version(ctx: &OverlayContext<'_>) -> LauncherResult<String> {
    if let Some(pinned) = ctx.loader_version {
        return Ok(pinned.to_string());
    }

    let versions = ctx.catalog.forge_versions(ctx.gateway, ctx.game_version).await?;
    versions
        .first()
        .map(|v| v.version.clone())
        .ok_or_else(|| LauncherError::NotFound(format!("Forge for {}", ctx.game_version)))
}

pub(super) async fn apply(ctx: &OverlayContext<'_>) -> LauncherResult<OverlayOutcome> {
    let forge_version = resolve_forge_version(ctx).await?;
    let layout = ForgeLayout::new(ctx.instance_dir, ctx.game_version, &forge_version);
    info!("Forge {} in {:?}", layout.version_id, layout.root);

    ctx.gateway.create_dir(&layout.root).await?;
    if !ctx.gateway.exists(&layout.profiles_path()).await {
        ctx.gateway
            .write_text(&layout.profiles_path(), DUMMY_PROFILES)
            .await?;
    }

    ForgeInstaller {
        ctx,
        layout: &layout,
        cache_dir: ctx.data_dir.join("cache").join("forge"),
    }
    .run()
    .await?;

    ctx.status.set("Analyzing Forge libraries...");
    let manifest = read_version(ctx.gateway, &layout.manifest_path()).await?;
    let main_class = manifest.main_class.clone().ok_or_else(|| {
        LauncherError::InstallFailure(format!("{} declares no main class", layout.version_id))
    })?;

    let libraries = forge_libraries(&manifest, &layout, ctx)?;
    let jvm_args = substitute_jvm_args(
        manifest.jvm_args(ctx.platform),
        &layout.libraries_dir().to_string_lossy(),
        ctx.platform.os.classpath_separator(),
        &layout.version_id,
    );

    Ok(OverlayOutcome {
        libraries,
        main_class,
        jvm_args,
        game_args: manifest.game_args(ctx.platform),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::{LoaderCatalog, Overlay};
    use crate::core::platform::{Arch, OsFamily, Platform};
    use crate::core::progress::StatusSink;
    use crate::core::testing::MockGateway;
    use serde_json::json;

    const MANIFEST: &str = "/data/instances/b/forge/versions/1.20.1-forge-47.2.0/1.20.1-forge-47.2.0.json";

    fn local_manifest() -> String {
        json!({
            "id": "1.20.1-forge-47.2.0",
            "inheritsFrom": "1.20.1",
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
            "libraries": [
                {
                    "name": "cpw.mods:securejarhandler:2.1.10",
                    "downloads": {"artifact": {
                        "path": "cpw/mods/securejarhandler/2.1.10/securejarhandler-2.1.10.jar",
                        "sha1": "51e6a22c6c716beb11e244bf5b8be480f51dd6b5",
                        "size": 88749,
                        "url": "https://maven.minecraftforge.net/cpw/mods/securejarhandler/2.1.10/securejarhandler-2.1.10.jar"
                    }}
                },
                {"name": "org.ow2.asm:asm:9.5"},
                {"name": "net.minecraftforge:fmlloader:1.20.1-47.2.0"}
            ],
            "arguments": {
                "game": ["--launchTarget", "forgeclient", "--fml.forgeVersion", "47.2.0"],
                "jvm": [
                    "-DignoreList=bootstraplauncher,securejarhandler,${version_name}.jar",
                    "-DlibraryDirectory=${library_directory}",
                    "-p",
                    "${library_directory}/cpw/mods/bootstraplauncher/1.1.2/bootstraplauncher-1.1.2.jar${classpath_separator}${library_directory}/cpw/mods/securejarhandler/2.1.10/securejarhandler-2.1.10.jar",
                    "--add-modules",
                    "ALL-MODULE-PATH"
                ]
            }
        })
        .to_string()
    }

    struct Fixture {
        gw: MockGateway,
        status: StatusSink,
        platform: Platform,
        catalog: LoaderCatalog,
        base: VersionJson,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                gw: MockGateway::new(),
                status: StatusSink::new(),
                platform: Platform::new(OsFamily::Linux, Arch::X86_64),
                catalog: LoaderCatalog::new(),
                base: serde_json::from_value(json!({"id": "1.20.1"})).unwrap(),
            }
        }

        fn ctx(&self) -> OverlayContext<'_> {
            OverlayContext {
                gateway: &self.gw,
                status: &self.status,
                platform: &self.platform,
                catalog: &self.catalog,
                base: &self.base,
                game_version: "1.20.1",
                loader_version: Some("47.2.0"),
                data_dir: Path::new("/data"),
                library_root: Path::new("/data/libraries"),
                instance_dir: Path::new("/data/instances/b"),
                java_path: Path::new("/opt/java/bin/java"),
            }
        }
    }

    #[test]
    fn jvm_placeholders_are_expanded_and_module_path_quoted() {
        let layout = ForgeLayout::new(Path::new("/b"), "1.20.1", "47.2.0");
        assert_eq!(layout.version_id, "1.20.1-forge-47.2.0");

        let args = substitute_jvm_args(
            vec![
                "-DignoreList=a,${version_name}.jar".into(),
                "-p".into(),
                "${library_directory}/a.jar${classpath_separator}${library_directory}/b.jar".into(),
            ],
            "/f/libraries",
            ":",
            &layout.version_id,
        );

        assert_eq!(
            args,
            vec![
                "-DignoreList=a,1.20.1-forge-47.2.0.jar",
                "-p",
                "\"/f/libraries/a.jar:/f/libraries/b.jar\"",
            ]
        );
    }

    #[test]
    fn args_without_module_path_are_left_alone() {
        let args = substitute_jvm_args(vec!["-Dfoo=bar".into()], "/l", ";", "v");
        assert_eq!(args, vec!["-Dfoo=bar"]);
    }

    #[tokio::test]
    async fn existing_local_manifest_skips_installer() {
        let fx = Fixture::new();
        fx.gw.put_file(MANIFEST, &local_manifest());

        let outcome = Overlay::Forge.apply(&fx.ctx()).await.unwrap();

        assert!(fx.gw.batches().is_empty());
        assert!(fx.gw.runs().is_empty());
        assert_eq!(outcome.main_class, "cpw.mods.bootstraplauncher.BootstrapLauncher");

        let paths: Vec<PathBuf> = outcome.libraries.iter().map(|l| l.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/data/instances/b/forge/libraries/cpw/mods/securejarhandler/2.1.10/securejarhandler-2.1.10.jar"),
                PathBuf::from("/data/instances/b/forge/libraries/org/ow2/asm/asm/9.5/asm-9.5.jar"),
                PathBuf::from("/data/instances/b/forge/libraries/net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar"),
            ]
        );
        assert_eq!(outcome.game_args[1], "forgeclient");
        assert!(outcome.jvm_args[3].starts_with("\"/data/instances/b/forge/libraries/cpw"));
        assert!(outcome.jvm_args[0].ends_with("1.20.1-forge-47.2.0.jar"));
        assert!(fx.gw.has_file("/data/instances/b/forge/launcher_profiles.json"));
    }

    #[tokio::test]
    async fn missing_manifest_runs_installer_once() {
        let fx = Fixture::new();
        fx.gw.run_creates(MANIFEST, &local_manifest());

        Overlay::Forge.apply(&fx.ctx()).await.unwrap();

        let batches = fx.gw.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].get("https://maven.minecraftforge.net/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar"),
            Some(&PathBuf::from("/data/cache/forge/forge-1.20.1-47.2.0-installer.jar"))
        );
        assert_eq!(fx.gw.runs(), vec![PathBuf::from("/data/cache/forge/install_forge.sh")]);
        let script = fx.gw.script("/data/cache/forge/install_forge.sh").unwrap();
        assert!(script.contains(
            "\"/opt/java/bin/java\" -jar \"/data/cache/forge/forge-1.20.1-47.2.0-installer.jar\" --installClient \"/data/instances/b/forge\""
        ));
    }

    #[tokio::test]
    async fn failing_installer_is_install_failure() {
        let fx = Fixture::new();
        fx.gw.set_run_result(false);

        let err = Overlay::Forge.apply(&fx.ctx()).await.unwrap_err();
        assert!(matches!(err, LauncherError::InstallFailure(_)));
    }

    #[tokio::test]
    async fn installer_without_output_is_install_failure() {
        let fx = Fixture::new();

        let err = Overlay::Forge.apply(&fx.ctx()).await.unwrap_err();
        assert!(matches!(err, LauncherError::InstallFailure(msg) if msg.contains("missing")));
    }

    #[tokio::test]
    async fn existing_profiles_file_is_kept() {
        let fx = Fixture::new();
        fx.gw.put_file(MANIFEST, &local_manifest());
        fx.gw.put_file("/data/instances/b/forge/launcher_profiles.json", "{\"mine\":1}");

        Overlay::Forge.apply(&fx.ctx()).await.unwrap();
        assert_eq!(
            fx.gw.file_text("/data/instances/b/forge/launcher_profiles.json").as_deref(),
            Some("{\"mine\":1}")
        );
    }
}
