//! Burrow command-line launcher.
//!
//! Usage:
//!   burrow new-build "My pack" 1.20.1 --loader fabric
//!   burrow launch My_pack
//!   burrow forge-versions 1.20.1

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use burrow_lib::core::gateway::{Gateway, LocalGateway};
use burrow_lib::core::instance::{load_descriptor, BuildDescriptor, BuildStore, LoaderType};
use burrow_lib::core::java;
use burrow_lib::core::loaders::LoaderCatalog;
use burrow_lib::core::session::{LaunchSession, Launcher};
use burrow_lib::core::state::{recommended_memory_mb, LauncherPaths, LauncherSettings, SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(name = "burrow")]
#[command(about = "Resolve, verify and launch Minecraft builds")]
struct Cli {
    /// Launcher data directory; defaults to the platform data dir.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Launch a build by directory name or path to its build.json
    Launch { build: String },
    /// List Fabric loader releases for a game version
    FabricVersions { game_version: String },
    /// List Forge versions for a game version
    ForgeVersions { game_version: String },
    /// Create a new build under instances/
    NewBuild {
        name: String,
        game_version: String,
        #[arg(long, default_value = "vanilla")]
        loader: LoaderType,
        #[arg(long)]
        loader_version: Option<String>,
    },
}

fn load_settings(paths: &LauncherPaths) -> Result<LauncherSettings> {
    if paths.data.join(SETTINGS_FILE).exists() {
        return Ok(LauncherSettings::load_or_default(&paths.data));
    }

    let settings = LauncherSettings {
        memory_mb: recommended_memory_mb(),
        java_path: java::find_system_java(),
        ..LauncherSettings::default()
    };
    settings
        .save(&paths.data)
        .with_context(|| format!("writing default settings in {}", paths.data.display()))?;
    info!("Wrote default settings to {:?}", paths.data.join(SETTINGS_FILE));
    Ok(settings)
}

async fn find_build(paths: &LauncherPaths, build: &str) -> Result<BuildDescriptor> {
    let as_path = PathBuf::from(build);
    if as_path.is_file() {
        return load_descriptor(&as_path)
            .await
            .with_context(|| format!("reading {}", as_path.display()));
    }
    BuildStore::new(&paths.instances)
        .load(build)
        .await
        .with_context(|| format!("loading build '{}'", build))
}

async fn launch(paths: LauncherPaths, build: &str) -> Result<()> {
    let mut settings = load_settings(&paths)?;
    if settings.java_path.is_none() {
        settings.java_path = java::find_system_java();
    }
    if let Some(java_path) = &settings.java_path {
        match java::probe_java(java_path) {
            Some(found) => info!("Java {} at {:?}", found.version, found.path),
            None => warn!("Could not read the version of {:?}", java_path),
        }
    }

    let build = find_build(&paths, build).await?;
    let required = java::required_java_for_minecraft_version(&build.game_version);
    info!("{} expects Java {}", build.game_version, required);

    let paths = paths.with_settings(&settings);
    let gateway: Arc<dyn Gateway> =
        Arc::new(LocalGateway::new()?.with_concurrency(settings.download_threads));
    let launcher = Launcher::new(gateway, paths, settings);
    let session = LaunchSession::new();

    let mut updates = session.status.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            if let Some(line) = updates.borrow_and_update().clone() {
                println!("{}", line);
            }
        }
    });

    let handle = launcher.launch(&build, &session).await?;
    println!("Started {}", handle.started.scripts.start.display());
    println!("Logs: {}", handle.started.scripts.debug.display());

    let exited_ok = handle.started.process.await.context("waiting for the game")??;
    printer.abort();
    if !exited_ok {
        bail!("the game exited with an error");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    burrow_lib::init_tracing();
    let cli = Cli::parse();
    let paths = LauncherPaths::resolve(cli.data_dir);

    match cli.command {
        Command::Launch { build } => launch(paths, &build).await?,
        Command::FabricVersions { game_version } => {
            let gateway = LocalGateway::new()?;
            let releases = LoaderCatalog::new()
                .fabric_releases(&gateway, &game_version)
                .await?;
            for release in releases.iter() {
                let tag = if release.loader.stable { "stable" } else { "" };
                println!("{} {}", release.loader.version, tag);
            }
        }
        Command::ForgeVersions { game_version } => {
            let gateway = LocalGateway::new()?;
            let versions = LoaderCatalog::new()
                .forge_versions(&gateway, &game_version)
                .await?;
            for version in versions.iter() {
                match version.date {
                    Some(date) => println!("{} {:?} {}", version.version, version.channel, date.date_naive()),
                    None => println!("{} {:?}", version.version, version.channel),
                }
            }
        }
        Command::NewBuild {
            name,
            game_version,
            loader,
            loader_version,
        } => {
            let build = BuildStore::new(&paths.instances)
                .create(&name, &game_version, loader, loader_version)
                .await?;
            println!("Created {} in {}", build.id, paths.instances.join(&build.dir_name).display());
        }
    }
    Ok(())
}
