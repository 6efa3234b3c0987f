//! Core types for Gantry

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{Configuration, PublishConfiguration};
use crate::error::Result;

/// Desktop platform an artifact is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS
    Mac,
    /// Windows
    Win,
    /// Linux
    Linux,
}

impl Platform {
    /// Returns the platform key used in options and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mac => "mac",
            Self::Win => "win",
            Self::Linux => "linux",
        }
    }

    /// Parse a platform name, accepting common aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mac" | "macos" | "darwin" | "osx" => Some(Self::Mac),
            "win" | "windows" | "win32" => Some(Self::Win),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Platform of the running host
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::Mac
        } else if cfg!(target_os = "windows") {
            Self::Win
        } else {
            Self::Linux
        }
    }

    /// All platforms in a stable order
    pub fn all() -> &'static [Platform] {
        &[Self::Mac, Self::Win, Self::Linux]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CPU architecture of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Ia32,
    X64,
    Armv7l,
    Arm64,
    Universal,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ia32 => "ia32",
            Self::X64 => "x64",
            Self::Armv7l => "armv7l",
            Self::Arm64 => "arm64",
            Self::Universal => "universal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ia32" | "x86" | "i686" => Some(Self::Ia32),
            "x64" | "x86_64" | "amd64" => Some(Self::X64),
            "armv7l" | "arm" => Some(Self::Armv7l),
            "arm64" | "aarch64" => Some(Self::Arm64),
            "universal" => Some(Self::Universal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application metadata handed to hooks and publishers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Package name
    pub name: String,
    /// Human-readable product name
    pub product_name: String,
    /// Application version
    pub version: String,
    /// Optional description
    pub description: Option<String>,
    /// Project root directory
    pub project_dir: PathBuf,
}

impl AppInfo {
    /// Create app info with the product name defaulting to the package name
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        Self {
            product_name: name.clone(),
            name,
            version: version.into(),
            description: None,
            project_dir: project_dir.into(),
        }
    }

    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of one artifact build
///
/// `artifact_paths` is append-only from the orchestrator's point of view:
/// entries produced by the builder are never removed or reordered.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Effective configuration the build ran with
    pub configuration: Configuration,
    /// Produced artifact files, in production order
    pub artifact_paths: Vec<String>,
    /// Application metadata
    pub app_info: AppInfo,
    /// Output directory artifacts were collected from
    pub out_dir: PathBuf,
}

impl BuildResult {
    pub fn new(configuration: Configuration, app_info: AppInfo, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            configuration,
            artifact_paths: Vec::new(),
            app_info,
            out_dir: out_dir.into(),
        }
    }

    pub fn with_artifacts<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifact_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Whether the exact path is already listed
    pub fn contains_artifact(&self, path: &str) -> bool {
        self.artifact_paths.iter().any(|p| p == path)
    }
}

/// Event emitted by a builder for every artifact it produces
#[derive(Debug, Clone)]
pub struct ArtifactCreated {
    /// Path of the produced file
    pub file: String,
    /// Architecture, if the artifact is architecture-specific
    pub arch: Option<Arch>,
    /// Platform the artifact was built for
    pub platform: Platform,
    /// Application metadata
    pub app_info: AppInfo,
    /// Publish configurations effective for this platform
    pub publish: Vec<PublishConfiguration>,
}

/// Receives artifact events while a build is running
pub trait ArtifactListener: Send + Sync {
    /// Called once per produced artifact
    fn artifact_created(&self, event: &ArtifactCreated) -> Result<()>;
}

/// Listener that ignores every event
#[derive(Debug, Default)]
pub struct NoopListener;

impl ArtifactListener for NoopListener {
    fn artifact_created(&self, _event: &ArtifactCreated) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_aliases() {
        assert_eq!(Platform::parse("darwin"), Some(Platform::Mac));
        assert_eq!(Platform::parse("Windows"), Some(Platform::Win));
        assert_eq!(Platform::parse("linux"), Some(Platform::Linux));
        assert_eq!(Platform::parse("beos"), None);
    }

    #[test]
    fn test_arch_roundtrip_names() {
        for arch in [Arch::Ia32, Arch::X64, Arch::Armv7l, Arch::Arm64, Arch::Universal] {
            assert_eq!(Arch::parse(arch.as_str()), Some(arch));
        }
        assert_eq!(Arch::parse("aarch64"), Some(Arch::Arm64));
    }

    #[test]
    fn test_build_result_contains_exact_path() {
        let result = BuildResult::new(
            Configuration::default(),
            AppInfo::new("app", "1.0.0", "/tmp/app"),
            "/tmp/app/dist",
        )
        .with_artifacts(["dist/app.exe"]);

        assert!(result.contains_artifact("dist/app.exe"));
        assert!(!result.contains_artifact("./dist/app.exe"));
    }
}
