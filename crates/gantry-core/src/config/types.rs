//! Configuration types

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PublishError, Result};
use crate::hooks::HookSpec;
use crate::types::{AppInfo, Platform};

use super::defaults::{default_targets, DEFAULT_OUTPUT_DIR};

/// Project configuration for Gantry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Package name
    pub name: Option<String>,

    /// Human-readable product name
    pub product_name: Option<String>,

    /// Application version
    pub version: Option<String>,

    /// Application description
    pub description: Option<String>,

    /// Directory layout
    pub directories: DirectoriesConfig,

    /// macOS packaging
    pub mac: PlatformConfig,

    /// Windows packaging
    pub win: PlatformConfig,

    /// Linux packaging
    pub linux: PlatformConfig,

    /// Publish destinations shared by every platform
    pub publish: Vec<PublishConfiguration>,

    /// Hook invoked once every artifact exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_all_artifact_build: Option<HookSpec>,
}

impl Configuration {
    /// Per-platform block
    pub fn platform(&self, platform: Platform) -> &PlatformConfig {
        match platform {
            Platform::Mac => &self.mac,
            Platform::Win => &self.win,
            Platform::Linux => &self.linux,
        }
    }

    /// Configured targets for a platform, falling back to platform defaults
    pub fn targets_for(&self, platform: Platform) -> Vec<String> {
        let configured = &self.platform(platform).target;
        if configured.is_empty() {
            default_targets(platform)
        } else {
            configured.clone()
        }
    }

    /// Publish destinations for a platform; a platform block overrides the global list
    pub fn publish_for(&self, platform: Platform) -> &[PublishConfiguration] {
        self.platform(platform)
            .publish
            .as_deref()
            .unwrap_or(&self.publish)
    }

    /// Absolute output directory for a project
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.directories.output)
    }

    /// Application metadata, defaulting the name to the project directory name
    pub fn app_info(&self, project_dir: &Path) -> AppInfo {
        let name = self.name.clone().unwrap_or_else(|| {
            project_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "app".to_string())
        });
        let version = self.version.clone().unwrap_or_else(|| "0.0.0".to_string());

        let mut info = AppInfo::new(name, version, project_dir);
        if let Some(ref product_name) = self.product_name {
            info = info.with_product_name(product_name);
        }
        if let Some(ref description) = self.description {
            info = info.with_description(description);
        }
        info
    }
}

/// Directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectoriesConfig {
    /// Output directory for artifacts, relative to the project directory
    pub output: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Packaging settings for one platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Packaging targets (e.g. "dmg", "nsis", "AppImage")
    pub target: Vec<String>,

    /// Shell command producing the artifacts for this platform
    pub command: Option<String>,

    /// Glob patterns, relative to the output directory, matching produced artifacts
    pub artifacts: Vec<String>,

    /// Platform-specific publish destinations
    pub publish: Option<Vec<PublishConfiguration>>,
}

/// Descriptor of one upload destination
///
/// Everything besides `provider` is provider-specific and kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishConfiguration {
    /// Provider name (e.g. "directory", "command")
    pub provider: String,

    /// Provider-specific options
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl PublishConfiguration {
    /// Create a configuration for a provider
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            options: BTreeMap::new(),
        }
    }

    /// Set an option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a string option
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Get a boolean option
    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Get a string option that the provider cannot work without
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.option_str(key).ok_or_else(|| {
            PublishError::InvalidConfiguration {
                provider: self.provider.clone(),
                message: format!("missing string option '{}'", key),
            }
            .into()
        })
    }
}

impl std::fmt::Display for PublishConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.provider)
    }
}

/// When artifacts get published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PublishPolicy {
    /// Always publish
    Always,
    /// Never publish
    Never,
    /// Publish only when building a tag on CI
    OnTag,
}

impl PublishPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::OnTag => "onTag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            "onTag" | "on-tag" => Some(Self::OnTag),
            _ => None,
        }
    }
}

impl std::fmt::Display for PublishPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();
        assert_eq!(config.directories.output, PathBuf::from("dist"));
        assert!(config.publish.is_empty());
        assert!(config.after_all_artifact_build.is_none());
        assert_eq!(config.targets_for(Platform::Win), vec!["nsis"]);
    }

    #[test]
    fn test_platform_publish_overrides_global() {
        let mut config = Configuration::default();
        config.publish = vec![PublishConfiguration::new("directory")];
        config.mac.publish = Some(vec![PublishConfiguration::new("command")]);

        assert_eq!(config.publish_for(Platform::Mac)[0].provider, "command");
        assert_eq!(config.publish_for(Platform::Linux)[0].provider, "directory");
    }

    #[test]
    fn test_parse_toml_configuration() {
        let config: Configuration = toml::from_str(
            r#"
name = "demo"
version = "1.2.3"
afterAllArtifactBuild = "scripts/after.sh"

[[publish]]
provider = "directory"
path = "releases"

[linux]
target = ["deb", "AppImage"]
command = "make package"
"#,
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("demo"));
        assert_eq!(config.linux.target, vec!["deb", "AppImage"]);
        assert_eq!(config.publish[0].option_str("path"), Some("releases"));
        assert!(matches!(
            config.after_all_artifact_build,
            Some(HookSpec::Named(ref name)) if name == "scripts/after.sh"
        ));
    }

    #[test]
    fn test_app_info_defaults_to_directory_name() {
        let config = Configuration::default();
        let info = config.app_info(Path::new("/work/my-app"));
        assert_eq!(info.name, "my-app");
        assert_eq!(info.product_name, "my-app");
        assert_eq!(info.version, "0.0.0");
    }

    #[test]
    fn test_require_str_reports_provider() {
        let config = PublishConfiguration::new("directory");
        let err = config.require_str("path").unwrap_err();
        assert!(err.to_string().contains("directory"));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_publish_policy_parse() {
        assert_eq!(PublishPolicy::parse("onTag"), Some(PublishPolicy::OnTag));
        assert_eq!(PublishPolicy::parse("always"), Some(PublishPolicy::Always));
        assert_eq!(PublishPolicy::parse("sometimes"), None);
    }
}
