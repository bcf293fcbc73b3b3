// ─── Burrow Core ───
// Resolves, verifies and assembles everything a game build needs to start.
//
// Architecture:
//   core/
//     gateway/    - Host capabilities (HTTP, files, archives, scripts)
//     version/    - Mojang manifest, version JSON, OS rules, client jar
//     libraries/  - Library set builder + native selection
//     assets/     - Asset index + object sync
//     loaders/    - Vanilla, Fabric and Forge overlays, loader catalogs
//     launch/     - Classpath, command line, natives, launch scripts
//     session     - Launch session and stage pipeline
//     instance/   - Build descriptors on disk
//     state/      - Settings and directory layout
//     java/       - System Java discovery

pub mod assets;
pub mod auth;
pub mod error;
pub mod gateway;
pub mod http;
pub mod instance;
pub mod java;
pub mod launch;
pub mod libraries;
pub mod loaders;
pub mod maven;
pub mod platform;
pub mod progress;
pub mod session;
pub mod state;
pub mod version;

#[cfg(test)]
pub mod testing;
