mod settings;

pub use settings::{recommended_memory_mb, LauncherPaths, LauncherSettings, SETTINGS_FILE};
