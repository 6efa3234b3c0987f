//! Gantry Core - Core library for building and publishing application artifacts
//!
//! This crate provides the foundational types, error handling, configuration,
//! cancellation and post-build hook model shared by the Gantry crates.

pub mod cancellation;
pub mod config;
pub mod error;
pub mod hooks;
pub mod types;

pub use cancellation::{check_cancelled, run_cancellable, CancellationToken};
pub use config::{
    BuildOptions, BuildRequest, Configuration, PublishConfiguration, PublishPolicy,
    ResolvedConfiguration,
};
pub use error::{BuildError, ConfigError, GantryError, HookError, PublishError, Result};
pub use hooks::{ArtifactHook, DefaultHookResolver, HookOutput, HookResolver, HookSpec};
pub use types::{AppInfo, Arch, ArtifactCreated, ArtifactListener, BuildResult, NoopListener, Platform};
