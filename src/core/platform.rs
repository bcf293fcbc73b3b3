// ─── Platform ───
// Operating system family × CPU architecture, and the matching rules that
// decide which native archives and rule-gated entries apply to a host.

use serde::{Deserialize, Serialize};

/// Operating system families the launcher distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Windows,
    #[serde(alias = "osx")]
    MacOs,
}

impl OsFamily {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    /// Name fragments a native archive or classifier key may use for this OS.
    pub fn tokens(self) -> &'static [&'static str] {
        match self {
            OsFamily::Linux => &["linux"],
            OsFamily::Windows => &["windows"],
            OsFamily::MacOs => &["macos", "osx"],
        }
    }

    /// Name used by Mojang `rules[].os.name`.
    pub fn rule_name(self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Windows => "windows",
            OsFamily::MacOs => "osx",
        }
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            OsFamily::Linux => ":",
            OsFamily::Windows | OsFamily::MacOs => ";",
        }
    }

    pub fn script_extension(self) -> &'static str {
        match self {
            OsFamily::Windows => "bat",
            OsFamily::Linux | OsFamily::MacOs => "sh",
        }
    }

    /// Wraps script lines into an executable body for this family.
    pub fn script(self, body: &str) -> String {
        match self {
            OsFamily::Windows => format!("@echo off\r\n{}\r\n", body.replace('\n', "\r\n")),
            OsFamily::Linux | OsFamily::MacOs => format!("#!/usr/bin/env bash\n{}\n", body),
        }
    }

    /// Whether a classifier key (e.g. `natives-osx`) targets this OS.
    pub fn matches_key(self, key: &str) -> bool {
        self.tokens().iter().any(|token| key.contains(token))
    }
}

/// CPU architectures with known native-archive spellings.
/// Anything else is carried verbatim and matched literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    Aarch64,
    Other(String),
}

impl Arch {
    pub fn current() -> Self {
        Self::from_name(std::env::consts::ARCH)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "x86" => Arch::X86,
            "x86_64" => Arch::X86_64,
            "arm" => Arch::Arm,
            "aarch64" => Arch::Aarch64,
            other => Arch::Other(other.to_string()),
        }
    }

    /// Value substituted for `${arch}` in legacy classifier keys.
    pub fn bits(&self) -> &'static str {
        match self {
            Arch::X86 | Arch::Arm => "32",
            _ => "64",
        }
    }

    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Arch::X86 => vec!["x86"],
            Arch::X86_64 => vec!["x86_64"],
            Arch::Arm => vec!["arm", "arm64"],
            Arch::Aarch64 => vec!["aarch64", "arm64"],
            Arch::Other(name) => vec![name.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self { os, arch }
    }

    pub fn current() -> Self {
        Self::new(OsFamily::current(), Arch::current())
    }

    /// Ranks `...-<os>.jar` and `...-<os>-<arch>.jar` archives.
    ///
    /// Archives without an architecture qualifier are accepted on every
    /// architecture; qualified ones only on a matching one.
    ///
    /// `Some(1)` for an accepted arch-qualified archive, `Some(0)` for an
    /// accepted unqualified one, `None` when the archive is rejected.
    pub fn native_specificity(&self, path: &str) -> Option<u8> {
        let stem = path.strip_suffix(".jar")?;
        let arch_tokens = self.arch.tokens();

        let qualified = self.os.tokens().iter().any(|os| {
            arch_tokens
                .iter()
                .any(|arch| stem.ends_with(&format!("{}-{}", os, arch)))
        });
        if qualified {
            return Some(1);
        }

        self.os
            .tokens()
            .iter()
            .any(|os| stem.ends_with(os))
            .then_some(0)
    }

    /// Matches a Mojang rule `os.arch` value. Absent means any.
    pub fn matches_arch_rule(&self, arch: Option<&str>) -> bool {
        match arch {
            None => true,
            Some(arch) => self.arch.tokens().contains(&arch),
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_x64() -> Platform {
        Platform::new(OsFamily::Linux, Arch::X86_64)
    }

    #[test]
    fn unqualified_native_is_accepted_on_any_arch() {
        let path = "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar";
        assert!(linux_x64().native_specificity(path).is_some());
        assert!(Platform::new(OsFamily::Linux, Arch::Aarch64).native_specificity(path).is_some());
    }

    #[test]
    fn qualified_native_needs_matching_arch() {
        let arm = "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux-arm64.jar";
        assert!(linux_x64().native_specificity(arm).is_none());
        assert!(Platform::new(OsFamily::Linux, Arch::Aarch64).native_specificity(arm).is_some());
        assert!(Platform::new(OsFamily::Linux, Arch::Arm).native_specificity(arm).is_some());
    }

    #[test]
    fn native_for_other_os_is_rejected() {
        let path = "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-windows.jar";
        assert!(linux_x64().native_specificity(path).is_none());
        assert!(Platform::new(OsFamily::Windows, Arch::X86_64).native_specificity(path).is_some());
    }

    #[test]
    fn macos_accepts_both_spellings() {
        let mac = Platform::new(OsFamily::MacOs, Arch::X86_64);
        assert!(mac.native_specificity("a/b-natives-osx.jar").is_some());
        assert!(mac.native_specificity("a/b-natives-macos.jar").is_some());
        assert!(mac.native_specificity("a/b-natives-macos-arm64.jar").is_none());
    }

    #[test]
    fn unknown_arch_matches_literally() {
        let riscv = Platform::new(OsFamily::Linux, Arch::from_name("riscv64"));
        assert!(riscv.native_specificity("x/y-natives-linux-riscv64.jar").is_some());
        assert!(riscv.native_specificity("x/y-natives-linux-x86_64.jar").is_none());
    }

    #[test]
    fn arch_qualified_natives_are_more_specific() {
        let arm = Platform::new(OsFamily::Linux, Arch::Aarch64);
        assert_eq!(arm.native_specificity("a/b-natives-linux.jar"), Some(0));
        assert_eq!(arm.native_specificity("a/b-natives-linux-arm64.jar"), Some(1));
        assert_eq!(arm.native_specificity("a/b-natives-windows.jar"), None);
    }

    #[test]
    fn classpath_separator_per_family() {
        assert_eq!(OsFamily::Linux.classpath_separator(), ":");
        assert_eq!(OsFamily::Windows.classpath_separator(), ";");
        assert_eq!(OsFamily::MacOs.classpath_separator(), ";");
    }

    #[test]
    fn scripts_get_a_family_header() {
        assert_eq!(
            OsFamily::Linux.script("\"java\" -version"),
            "#!/usr/bin/env bash\n\"java\" -version\n"
        );
        assert_eq!(
            OsFamily::Windows.script("java\npause"),
            "@echo off\r\njava\r\npause\r\n"
        );
    }

    #[test]
    fn classifier_keys_match_os_tokens() {
        assert!(OsFamily::MacOs.matches_key("natives-osx"));
        assert!(OsFamily::Linux.matches_key("natives-linux"));
        assert!(!OsFamily::Windows.matches_key("natives-linux"));
    }
}
