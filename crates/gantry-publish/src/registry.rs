//! Publisher registry

use std::sync::Arc;
use tracing::debug;

use gantry_core::{PublishError, Result};

use crate::providers::{CommandPublisher, DirectoryPublisher};
use crate::traits::Publisher;

/// Registry of available publishers, keyed by provider name
pub struct PublisherRegistry {
    publishers: Vec<Arc<dyn Publisher>>,
}

impl PublisherRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            publishers: Vec::new(),
        }
    }

    /// Registry with the built-in `directory` and `command` publishers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DirectoryPublisher::new());
        registry.register(CommandPublisher::new());
        registry
    }

    /// Register a publisher; a later registration for the same provider wins
    pub fn register<P: Publisher + 'static>(&mut self, publisher: P) {
        self.register_arc(Arc::new(publisher));
    }

    /// Register a pre-built publisher
    pub fn register_arc(&mut self, publisher: Arc<dyn Publisher>) {
        self.publishers.retain(|p| p.provider() != publisher.provider());
        self.publishers.push(publisher);
    }

    /// Get publisher by provider name
    pub fn get(&self, provider: &str) -> Option<Arc<dyn Publisher>> {
        let result = self
            .publishers
            .iter()
            .find(|p| p.provider() == provider)
            .cloned();
        debug!(provider, found = result.is_some(), "Looking up publisher");
        result
    }

    /// Get publisher by provider name, failing for unknown providers
    pub fn require(&self, provider: &str) -> Result<Arc<dyn Publisher>> {
        self.get(provider)
            .ok_or_else(|| PublishError::UnknownProvider(provider.to_string()).into())
    }

    /// Get names of all registered providers
    pub fn names(&self) -> Vec<String> {
        self.publishers
            .iter()
            .map(|p| p.provider().to_string())
            .collect()
    }
}

impl Default for PublisherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
