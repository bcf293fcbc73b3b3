use crate::core::libraries::LibrarySet;
use crate::core::platform::OsFamily;

/// Library paths in set order, joined with the family's separator.
pub fn build_classpath(libraries: &LibrarySet, os: OsFamily) -> String {
    libraries
        .iter()
        .map(|library| library.path.display().to_string())
        .collect::<Vec<_>>()
        .join(os.classpath_separator())
}

/// Escapes spaces so the classpath survives inside a launch script.
pub fn escape_spaces(raw: &str) -> String {
    raw.replace(' ', "\\ ")
}
