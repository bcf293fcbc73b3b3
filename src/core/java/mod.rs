mod detect;

pub use detect::find_system_java;
pub use detect::parse_major_version;
pub use detect::probe_java;
pub use detect::required_java_for_minecraft_version;
pub use detect::JavaInstallation;
