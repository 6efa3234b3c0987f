//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::options::{BuildRequest, ConfigSource};
use super::types::Configuration;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Configuration> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Configuration = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Configuration, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Configuration a build runs with
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    /// Effective configuration
    pub configuration: Configuration,
    /// Project directory
    pub project_dir: PathBuf,
    /// File the configuration came from, if any
    pub source: Option<PathBuf>,
}

/// Resolve the configuration for a build request.
///
/// An inline configuration is used as given (validated unless
/// `effectiveOptionComputed` is set), a path is loaded relative to the
/// project directory, and otherwise the project directory is searched.
/// A project without any configuration file builds with defaults.
pub fn resolve_configuration(request: &BuildRequest) -> Result<ResolvedConfiguration> {
    let project_dir = request.project_dir()?;

    let (configuration, source) = match request.config {
        Some(ConfigSource::Inline(ref config)) => {
            if request.is_effective_option_computed() {
                debug!("using precomputed inline configuration");
            } else {
                validate_config(config)?;
            }
            (config.as_ref().clone(), None)
        }
        Some(ConfigSource::Path(ref path)) => {
            let path = project_dir.join(path);
            (load_config(&path)?, Some(path))
        }
        None => match find_config(&project_dir) {
            Some(path) => (load_config(&path)?, Some(path)),
            None => {
                warn!(dir = %project_dir.display(), "no config found, using defaults");
                (Configuration::default(), None)
            }
        },
    };

    Ok(ResolvedConfiguration {
        configuration,
        project_dir,
        source,
    })
}
