//! Error types for Gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for Gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Artifact build errors
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Post-build hook errors
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Publishing errors
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The invocation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Build request carries an option outside the allow-list
    #[error("Unknown option \"{0}\"")]
    UnknownOption(String),

    /// A recognised option has a value of the wrong shape
    #[error("Invalid option \"{option}\": {message}")]
    InvalidOption { option: String, message: String },

    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Artifact build errors
#[derive(Debug, Error)]
pub enum BuildError {
    /// Packaging command exited unsuccessfully
    #[error("Build command failed for {platform}: {command} (exit code {exit_code:?})")]
    CommandFailed {
        platform: String,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Packaging command could not be started
    #[error("Failed to spawn build command '{command}': {message}")]
    SpawnFailed { command: String, message: String },

    /// Nothing was produced for a platform
    #[error("No artifacts produced for {platform} in {out_dir}")]
    NoArtifacts { platform: String, out_dir: PathBuf },

    /// Platform has no packaging command configured
    #[error("No build command configured for {0}")]
    MissingCommand(String),

    /// Invalid artifact glob pattern
    #[error("Invalid artifact pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Post-build hook errors
#[derive(Debug, Error)]
pub enum HookError {
    /// Hook name did not resolve to anything
    #[error("Cannot resolve {label} hook '{name}': not registered and no file at {path}")]
    NotFound {
        label: String,
        name: String,
        path: PathBuf,
    },

    /// Hook ran and failed
    #[error("{label} hook '{name}' failed: {message}")]
    ExecutionFailed {
        label: String,
        name: String,
        message: String,
    },

    /// Hook output could not be interpreted as artifact paths
    #[error("{label} hook '{name}' returned invalid output: {message}")]
    InvalidOutput {
        label: String,
        name: String,
        message: String,
    },
}

/// Publishing errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// No publisher is registered for the provider
    #[error("Unknown publish provider: {0}")]
    UnknownProvider(String),

    /// A publish configuration is missing or has a malformed option
    #[error("Invalid {provider} publish configuration: {message}")]
    InvalidConfiguration { provider: String, message: String },

    /// A single upload failed
    #[error("Failed to upload {file} to {provider}: {message}")]
    UploadFailed {
        file: String,
        provider: String,
        message: String,
    },

    /// One or more scheduled uploads failed
    #[error("{failed} of {total} uploads failed, first error: {first}")]
    UploadsFailed {
        failed: usize,
        total: usize,
        first: String,
    },

    /// An upload task panicked
    #[error("Upload task panicked: {0}")]
    TaskPanicked(String),
}

impl GantryError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error represents cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Build(_) => 10,
            Self::Hook(_) => 11,
            Self::Publish(_) => 12,
            Self::Cancelled => 130,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => 1,
        }
    }
}
