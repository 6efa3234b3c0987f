//! Post-build hooks
//!
//! A hook runs once every artifact of a build exists and may contribute
//! further artifacts. Configuration names a hook either by a name that a
//! resolver turns into something callable, or hands over a callable
//! directly when the build is driven through the library API.

mod command;

pub use command::CommandHook;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{HookError, Result};
use crate::types::{AppInfo, BuildResult};

/// Artifacts returned by a hook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HookOutput {
    /// Nothing to add
    #[default]
    None,
    /// One artifact path
    Single(String),
    /// Several artifact paths, in order
    Many(Vec<String>),
}

impl HookOutput {
    /// Normalise into an ordered list of paths
    pub fn into_paths(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Single(path) => vec![path],
            Self::Many(paths) => paths,
        }
    }
}

impl From<String> for HookOutput {
    fn from(path: String) -> Self {
        Self::Single(path)
    }
}

impl From<&str> for HookOutput {
    fn from(path: &str) -> Self {
        Self::Single(path.to_string())
    }
}

impl From<Vec<String>> for HookOutput {
    fn from(paths: Vec<String>) -> Self {
        Self::Many(paths)
    }
}

impl<T: Into<HookOutput>> From<Option<T>> for HookOutput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// A resolved, callable hook
#[async_trait]
pub trait ArtifactHook: Send + Sync {
    /// Run the hook against a finished build
    async fn run(&self, result: &BuildResult) -> Result<HookOutput>;
}

/// Hook backed by a plain closure
pub struct FnHook<F> {
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(&BuildResult) -> Result<HookOutput> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> ArtifactHook for FnHook<F>
where
    F: Fn(&BuildResult) -> Result<HookOutput> + Send + Sync,
{
    async fn run(&self, result: &BuildResult) -> Result<HookOutput> {
        (self.f)(result)
    }
}

/// How a hook is named in configuration
#[derive(Clone)]
pub enum HookSpec {
    /// Registered hook name or script path relative to the project directory
    Named(String),
    /// Callable supplied directly
    Function(Arc<dyn ArtifactHook>),
}

impl HookSpec {
    /// Wrap a closure as a hook
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&BuildResult) -> Result<HookOutput> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(FnHook::new(f)))
    }

    /// Name used in logs and errors
    pub fn display_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Function(_) => "<function>",
        }
    }
}

impl fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl Serialize for HookSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Named(name) => serializer.serialize_str(name),
            Self::Function(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for HookSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Named)
    }
}

/// Turns a configured hook into something callable
#[async_trait]
pub trait HookResolver: Send + Sync {
    /// Resolve a hook; `Ok(None)` means there is nothing to run
    async fn resolve(
        &self,
        app: &AppInfo,
        hook: &HookSpec,
        label: &str,
    ) -> Result<Option<Arc<dyn ArtifactHook>>>;
}

/// Resolver for registered names, functions and scripts in the project
#[derive(Default)]
pub struct DefaultHookResolver {
    named: HashMap<String, Arc<dyn ArtifactHook>>,
}

impl DefaultHookResolver {
    /// Create a resolver without registered hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under a name
    pub fn register(&mut self, name: impl Into<String>, hook: Arc<dyn ArtifactHook>) {
        self.named.insert(name.into(), hook);
    }

    /// Builder-style registration
    pub fn with_hook(mut self, name: impl Into<String>, hook: Arc<dyn ArtifactHook>) -> Self {
        self.register(name, hook);
        self
    }

    /// Registered hook names
    pub fn names(&self) -> Vec<&str> {
        self.named.keys().map(|k| k.as_str()).collect()
    }
}

#[async_trait]
impl HookResolver for DefaultHookResolver {
    async fn resolve(
        &self,
        app: &AppInfo,
        hook: &HookSpec,
        label: &str,
    ) -> Result<Option<Arc<dyn ArtifactHook>>> {
        let name = match hook {
            HookSpec::Function(f) => return Ok(Some(Arc::clone(f))),
            HookSpec::Named(name) => name.trim(),
        };

        if name.is_empty() {
            debug!(label, "hook configured with an empty name, nothing to run");
            return Ok(None);
        }

        if let Some(registered) = self.named.get(name) {
            debug!(label, name, "resolved registered hook");
            return Ok(Some(Arc::clone(registered)));
        }

        let path = app.project_dir.join(name);
        if path.is_file() {
            debug!(label, path = %path.display(), "resolved hook script");
            return Ok(Some(Arc::new(CommandHook::new(label, name, path))));
        }

        Err(HookError::NotFound {
            label: label.to_string(),
            name: name.to_string(),
            path,
        }
        .into())
    }
}
