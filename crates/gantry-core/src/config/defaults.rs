//! Default configuration values

use crate::types::Platform;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gantry.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gantry.yaml";

/// Default output directory, relative to the project directory
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Label of the hook that runs after every artifact has been built
pub const AFTER_ALL_ARTIFACT_BUILD: &str = "afterAllArtifactBuild";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".gantry.toml",
        ".gantry.yaml",
    ]
}

/// Targets built for a platform when neither the request nor the
/// configuration names any
pub fn default_targets(platform: Platform) -> Vec<String> {
    let targets: &[&str] = match platform {
        Platform::Mac => &["dmg", "zip"],
        Platform::Win => &["nsis"],
        Platform::Linux => &["AppImage"],
    };
    targets.iter().map(|t| t.to_string()).collect()
}

/// File extension produced by a packaging target
pub fn target_extension(target: &str) -> &str {
    match target {
        "nsis" | "nsis-web" | "portable" | "squirrel" => "exe",
        "appx" => "appx",
        "dir" => "",
        other => other,
    }
}
