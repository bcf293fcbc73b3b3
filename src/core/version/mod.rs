mod client;
mod manifest;
mod version_file;

pub use client::{ClientPlacement, ClientVerifier, CLIENT_LABEL};
pub use manifest::{read_version, ManifestResolver, VersionEntry, VersionIndex, VERSION_MANIFEST_URL};
pub use version_file::{
    rules_allow, Argument, ArgumentValue, Arguments, AssetIndexInfo, DownloadArtifact,
    LibDownloadArtifact, LibraryDownloads, LibraryEntry, OsRule, Rule, RuleAction,
    VersionDownloads, VersionJson, LEGACY_MAIN_CLASS,
};
