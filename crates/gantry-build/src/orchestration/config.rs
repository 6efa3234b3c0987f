//! Orchestrator configuration
//!
//! Settings that come from the environment rather than the project
//! configuration: upload concurrency and the CI facts behind the default
//! publish policy.

use gantry_publish::{CiEnvironment, DEFAULT_UPLOAD_CONCURRENCY};
use tracing::warn;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum concurrent uploads
    pub upload_concurrency: usize,

    /// Detected CI environment
    pub ci: CiEnvironment,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            ci: CiEnvironment::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            ci: CiEnvironment::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(v) = lookup("GANTRY_UPLOAD_CONCURRENCY") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.upload_concurrency = n,
                _ => warn!(value = %v, "ignoring invalid GANTRY_UPLOAD_CONCURRENCY"),
            }
        }

        config
    }

    // Builder methods

    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency.max(1);
        self
    }

    pub fn with_ci(mut self, ci: CiEnvironment) -> Self {
        self.ci = ci;
        self
    }
}
