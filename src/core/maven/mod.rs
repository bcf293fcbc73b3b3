mod artifact;

pub use artifact::{short_name, MavenArtifact};

/// Well-known Maven repositories used by the Minecraft ecosystem.
pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";
