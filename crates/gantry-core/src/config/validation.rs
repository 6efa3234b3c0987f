//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::hooks::HookSpec;
use crate::types::Platform;

use super::types::{Configuration, PublishConfiguration};

/// Validate configuration
pub fn validate_config(config: &Configuration) -> Result<()> {
    debug!("validating configuration");
    validate_metadata(config)?;
    validate_directories(config)?;
    validate_publish(&config.publish, "publish")?;
    for platform in Platform::all() {
        validate_platform(config, *platform)?;
    }
    validate_hook(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_metadata(config: &Configuration) -> Result<()> {
    if let Some(ref version) = config.version {
        if let Err(e) = semver::Version::parse(version) {
            return Err(ConfigError::InvalidValue {
                field: "version".to_string(),
                message: format!("'{}' is not a semantic version: {}", version, e),
            }
            .into());
        }
    }

    if config.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ConfigError::InvalidValue {
            field: "name".to_string(),
            message: "name cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_directories(config: &Configuration) -> Result<()> {
    if config.directories.output.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "directories.output".to_string(),
            message: "output directory cannot be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_publish(publish: &[PublishConfiguration], field: &str) -> Result<()> {
    for (i, entry) in publish.iter().enumerate() {
        if entry.provider.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("{}[{}].provider", field, i),
                message: "provider cannot be empty".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn validate_platform(config: &Configuration, platform: Platform) -> Result<()> {
    let block = config.platform(platform);

    if block.target.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::InvalidValue {
            field: format!("{}.target", platform),
            message: "target names cannot be empty".to_string(),
        }
        .into());
    }

    for pattern in &block.artifacts {
        if let Err(e) = glob::Pattern::new(pattern) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.artifacts", platform),
                message: format!("invalid glob '{}': {}", pattern, e),
            }
            .into());
        }
    }

    if let Some(ref publish) = block.publish {
        validate_publish(publish, &format!("{}.publish", platform))?;
    }

    Ok(())
}

fn validate_hook(config: &Configuration) -> Result<()> {
    if let Some(HookSpec::Named(ref name)) = config.after_all_artifact_build {
        if name.contains('\0') {
            return Err(ConfigError::InvalidValue {
                field: "afterAllArtifactBuild".to_string(),
                message: "hook name contains a NUL byte".to_string(),
            }
            .into());
        }
    }
    Ok(())
}
