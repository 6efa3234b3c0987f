//! Build request options and the option allow-list

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::Platform;

use super::types::{Configuration, PublishPolicy};

/// Option names a build request may carry
pub const EXPECTED_OPTIONS: &[&str] = &[
    "publish",
    "targets",
    "mac",
    "win",
    "linux",
    "projectDir",
    "config",
    "effectiveOptionComputed",
    "prepackaged",
];

/// Raw build request as assembled by callers
pub type BuildOptions = serde_json::Map<String, Value>;

/// Reject any option outside the allow-list that carries a value.
///
/// A key whose value is `null` counts as absent.
pub fn check_build_request_options(options: &BuildOptions) -> Result<()> {
    for (key, value) in options {
        if !value.is_null() && !EXPECTED_OPTIONS.contains(&key.as_str()) {
            return Err(ConfigError::UnknownOption(key.clone()).into());
        }
    }
    Ok(())
}

/// Project configuration supplied with the request
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConfigSource {
    /// Path to a configuration file, relative to the project directory
    Path(PathBuf),
    /// Configuration object
    Inline(Box<Configuration>),
}

/// Validated, immutable build request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Publish policy
    pub publish: Option<PublishPolicy>,

    /// Targets per platform
    pub targets: Option<BTreeMap<Platform, Vec<String>>>,

    /// macOS targets (empty means the configured defaults)
    pub mac: Option<Vec<String>>,

    /// Windows targets
    pub win: Option<Vec<String>>,

    /// Linux targets
    pub linux: Option<Vec<String>>,

    /// Project directory, defaults to the current directory
    pub project_dir: Option<PathBuf>,

    /// Configuration override
    pub config: Option<ConfigSource>,

    /// Inline configuration is already final and skips validation
    pub effective_option_computed: Option<bool>,

    /// Pre-packaged application directory handed to the build command
    pub prepackaged: Option<PathBuf>,
}

impl BuildRequest {
    /// Validate raw options and convert them into a request
    pub fn from_options(options: &BuildOptions) -> Result<Self> {
        check_build_request_options(options)?;

        match serde_json::from_value::<BuildRequest>(Value::Object(options.clone())) {
            Ok(request) => {
                debug!(options = options.len(), "build request validated");
                Ok(request)
            }
            Err(e) => Err(locate_invalid_option(options).unwrap_or_else(|| {
                ConfigError::ParseError(format!("invalid build request: {}", e))
            })
            .into()),
        }
    }

    /// Absolute project directory, falling back to the current working directory.
    ///
    /// Child processes run inside this directory and also receive paths
    /// derived from it, so a relative directory is anchored here once.
    pub fn project_dir(&self) -> Result<PathBuf> {
        match self.project_dir {
            Some(ref dir) if dir.is_absolute() => Ok(dir.clone()),
            Some(ref dir) => Ok(std::env::current_dir()?.join(dir)),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Whether an inline configuration skips validation
    pub fn is_effective_option_computed(&self) -> bool {
        self.effective_option_computed.unwrap_or(false)
    }

    fn platform_targets(&self, platform: Platform) -> Option<&Vec<String>> {
        match platform {
            Platform::Mac => self.mac.as_ref(),
            Platform::Win => self.win.as_ref(),
            Platform::Linux => self.linux.as_ref(),
        }
    }

    /// Platforms and targets to build, in platform order.
    ///
    /// The `targets` map wins over the per-platform lists; with neither,
    /// the host platform is built with its configured targets. An empty
    /// target list means the configured targets for that platform.
    pub fn target_selection(&self, config: &Configuration) -> Vec<(Platform, Vec<String>)> {
        let resolve = |platform: Platform, targets: &Vec<String>| {
            if targets.is_empty() {
                (platform, config.targets_for(platform))
            } else {
                (platform, targets.clone())
            }
        };

        if let Some(ref map) = self.targets {
            if !map.is_empty() {
                return map.iter().map(|(p, t)| resolve(*p, t)).collect();
            }
        }

        let selected: Vec<_> = Platform::all()
            .iter()
            .filter_map(|p| self.platform_targets(*p).map(|t| resolve(*p, t)))
            .collect();

        if selected.is_empty() {
            let host = Platform::current();
            vec![(host, config.targets_for(host))]
        } else {
            selected
        }
    }
}

/// Find the first option whose value alone fails to deserialize
fn locate_invalid_option(options: &BuildOptions) -> Option<ConfigError> {
    options.iter().find_map(|(key, value)| {
        let mut single = BuildOptions::new();
        single.insert(key.clone(), value.clone());
        serde_json::from_value::<BuildRequest>(Value::Object(single))
            .err()
            .map(|e| ConfigError::InvalidOption {
                option: key.clone(),
                message: e.to_string(),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> BuildOptions {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_unknown_option_with_value_is_rejected() {
        let err = check_build_request_options(&options(json!({"foo": "bar"}))).unwrap_err();
        assert_eq!(err.to_string(), "Unknown option \"foo\"");
    }

    #[test]
    fn test_unknown_option_with_null_is_accepted() {
        assert!(check_build_request_options(&options(json!({"foo": null}))).is_ok());
    }

    #[test]
    fn test_falsy_values_still_count_as_defined() {
        for value in [json!(false), json!(0), json!(""), json!([])] {
            let opts = options(json!({ "typo": value }));
            assert!(check_build_request_options(&opts).is_err());
        }
    }

    #[test]
    fn test_relative_project_dir_is_anchored_to_cwd() {
        let request = BuildRequest::from_options(&options(json!({ "projectDir": "app" }))).unwrap();
        let dir = request.project_dir().unwrap();
        assert!(dir.is_absolute());
        assert_eq!(dir, std::env::current_dir().unwrap().join("app"));

        let root = std::env::temp_dir().join("work");
        let absolute =
            BuildRequest::from_options(&options(json!({ "projectDir": root }))).unwrap();
        assert_eq!(absolute.project_dir().unwrap(), root);
    }

    #[test]
    fn test_from_options_parses_known_fields() {
        let request = BuildRequest::from_options(&options(json!({
            "publish": "never",
            "linux": ["deb"],
            "projectDir": "/tmp/project",
            "effectiveOptionComputed": true,
            "unused": null,
        })))
        .unwrap();

        assert_eq!(request.publish, Some(PublishPolicy::Never));
        assert_eq!(request.linux, Some(vec!["deb".to_string()]));
        assert_eq!(request.project_dir, Some(PathBuf::from("/tmp/project")));
        assert!(request.is_effective_option_computed());
    }

    #[test]
    fn test_from_options_names_malformed_option() {
        let err = BuildRequest::from_options(&options(json!({
            "linux": ["deb"],
            "publish": "sometimes",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("\"publish\""), "{}", err);
    }

    #[test]
    fn test_config_source_variants() {
        let request = BuildRequest::from_options(&options(json!({
            "config": "custom/gantry.yaml"
        })))
        .unwrap();
        assert!(matches!(request.config, Some(ConfigSource::Path(_))));

        let request = BuildRequest::from_options(&options(json!({
            "config": { "name": "inline", "version": "2.0.0" }
        })))
        .unwrap();
        match request.config {
            Some(ConfigSource::Inline(config)) => assert_eq!(config.name.as_deref(), Some("inline")),
            other => panic!("unexpected config source: {:?}", other),
        }
    }

    #[test]
    fn test_target_selection_prefers_targets_map() {
        let request = BuildRequest::from_options(&options(json!({
            "targets": { "win": ["portable"] },
            "linux": ["deb"],
        })))
        .unwrap();
        let selection = request.target_selection(&Configuration::default());
        assert_eq!(selection, vec![(Platform::Win, vec!["portable".to_string()])]);
    }

    #[test]
    fn test_target_selection_empty_list_uses_configuration() {
        let mut config = Configuration::default();
        config.linux.target = vec!["tar.gz".to_string()];

        let request = BuildRequest::from_options(&options(json!({
            "mac": [],
            "linux": [],
        })))
        .unwrap();
        let selection = request.target_selection(&config);
        assert_eq!(
            selection,
            vec![
                (Platform::Mac, vec!["dmg".to_string(), "zip".to_string()]),
                (Platform::Linux, vec!["tar.gz".to_string()]),
            ]
        );
    }

    #[test]
    fn test_target_selection_defaults_to_host() {
        let selection = BuildRequest::default().target_selection(&Configuration::default());
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].0, Platform::current());
    }
}
