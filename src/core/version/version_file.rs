// ─── Version File ───
// Parses a Mojang-format version JSON and evaluates OS rules against a
// target platform. Forge's installed version JSON uses the same shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::Platform;

/// Main class used by builds older than 1.6.
pub const LEGACY_MAIN_CLASS: &str = "net.minecraft.client.Minecraft";

/// A fully parsed version JSON.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    /// Asset index id (`"8"`, `"legacy"`, ...).
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<DownloadArtifact>,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// One `arguments.game|jvm` element: either a bare string or a
/// rule-gated object carrying one or more values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// OS family → classifier key (pre-1.19 native layout).
    #[serde(default)]
    pub natives: Option<BTreeMap<String, String>>,
    /// Maven repository the artifact is served from (loader manifests).
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<BTreeMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibDownloadArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    /// Launcher feature flags (`is_demo_user`, ...). None are enabled here.
    #[serde(default)]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl Rule {
    fn applies_to(&self, platform: &Platform) -> bool {
        if self.features.as_ref().is_some_and(|f| !f.is_empty()) {
            return false;
        }

        match &self.os {
            None => true,
            Some(os) => {
                let name_matches = os
                    .name
                    .as_deref()
                    .map_or(true, |name| name == platform.os.rule_name());
                name_matches && platform.matches_arch_rule(os.arch.as_deref())
            }
        }
    }
}

/// Mojang rule semantics:
/// - no rules → allowed;
/// - otherwise start disallowed, and every rule whose condition matches
///   overwrites the verdict with its action.
pub fn rules_allow(rules: &[Rule], platform: &Platform) -> bool {
    if rules.is_empty() {
        return true;
    }

    rules
        .iter()
        .filter(|rule| rule.applies_to(platform))
        .fold(false, |_, rule| rule.action == RuleAction::Allow)
}

impl LibraryEntry {
    /// Native archives are either rule-gated `*native*` coordinates or
    /// entries carrying a `natives` map.
    pub fn is_native(&self) -> bool {
        (self.name.contains("native") && self.rules.is_some()) || self.natives.is_some()
    }

    pub fn is_allowed_on(&self, platform: &Platform) -> bool {
        self.rules
            .as_deref()
            .map_or(true, |rules| rules_allow(rules, platform))
    }
}

impl Argument {
    /// Values this argument contributes on `platform`.
    pub fn values_for(&self, platform: &Platform) -> Vec<String> {
        match self {
            Argument::Plain(value) => vec![value.clone()],
            Argument::Conditional { rules, value } => {
                if !rules_allow(rules, platform) {
                    return vec![];
                }
                match value {
                    ArgumentValue::One(v) => vec![v.clone()],
                    ArgumentValue::Many(vs) => vs.clone(),
                }
            }
        }
    }
}

fn flatten(args: &[Argument], platform: &Platform) -> Vec<String> {
    args.iter().flat_map(|arg| arg.values_for(platform)).collect()
}

impl VersionJson {
    /// Asset index id, preferring the top-level `assets` field.
    pub fn asset_index_id(&self) -> Option<&str> {
        self.assets
            .as_deref()
            .or(self.asset_index.as_ref().map(|index| index.id.as_str()))
    }

    pub fn client_download(&self) -> LauncherResult<&DownloadArtifact> {
        self.downloads
            .as_ref()
            .and_then(|d| d.client.as_ref())
            .ok_or_else(|| LauncherError::NotFound(format!("client download for {}", self.id)))
    }

    pub fn game_args(&self, platform: &Platform) -> Vec<String> {
        match &self.arguments {
            Some(args) => flatten(&args.game, platform),
            None => self
                .minecraft_arguments
                .as_deref()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    pub fn jvm_args(&self, platform: &Platform) -> Vec<String> {
        self.arguments
            .as_ref()
            .map(|args| flatten(&args.jvm, platform))
            .unwrap_or_default()
    }

    /// Entry point for an unmodded launch of `game_version`.
    ///
    /// Builds before 1.6 always use the legacy applet class. Versions whose
    /// minor component cannot be read (snapshots) use the declared class.
    pub fn vanilla_main_class(&self, game_version: &str) -> String {
        let mut parts = game_version.split('.').map(|p| p.parse::<u32>().ok());
        let major = parts.next().flatten();
        let minor = match major {
            Some(1) => parts.next().flatten(),
            other => other,
        };

        match minor {
            Some(minor) if minor < 6 => LEGACY_MAIN_CLASS.to_string(),
            _ => self
                .main_class
                .clone()
                .unwrap_or_else(|| LEGACY_MAIN_CLASS.to_string()),
        }
    }
}
