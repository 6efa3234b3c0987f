//! Publish manager construction per build invocation

use std::sync::Arc;

use tracing::info;

use gantry_core::{BuildRequest, CancellationToken, Result};
use gantry_publish::{
    should_publish, PublishManager, PublisherRegistry, SchedulerOptions, UploadScheduler,
};

use crate::orchestration::OrchestratorConfig;

/// Creates the publish manager of one build invocation
pub trait PublishManagerFactory: Send + Sync {
    /// Create a manager bound to the invocation's cancellation token
    fn create(
        &self,
        request: &BuildRequest,
        token: &CancellationToken,
    ) -> Result<Arc<dyn PublishManager>>;
}

/// Factory producing [`UploadScheduler`]s
pub struct DefaultPublishManagerFactory {
    registry: Arc<PublisherRegistry>,
    config: OrchestratorConfig,
}

impl DefaultPublishManagerFactory {
    pub fn new(registry: Arc<PublisherRegistry>, config: OrchestratorConfig) -> Self {
        Self { registry, config }
    }

    /// Built-in publishers, settings from the environment
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(PublisherRegistry::with_builtins()),
            OrchestratorConfig::from_env(),
        )
    }
}

impl PublishManagerFactory for DefaultPublishManagerFactory {
    fn create(
        &self,
        request: &BuildRequest,
        token: &CancellationToken,
    ) -> Result<Arc<dyn PublishManager>> {
        let publish = should_publish(request.publish, &self.config.ci);
        info!(
            publish,
            policy = ?request.publish,
            tag = ?self.config.ci.tag,
            "publish policy resolved"
        );

        Ok(Arc::new(UploadScheduler::new(
            Arc::clone(&self.registry),
            token,
            SchedulerOptions {
                concurrency: self.config.upload_concurrency,
                publish,
            },
        )))
    }
}
