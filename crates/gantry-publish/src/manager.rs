//! Publish manager contract

use async_trait::async_trait;
use tracing::debug;

use gantry_core::{AppInfo, ArtifactCreated, Configuration, PublishConfiguration, Result};

use crate::types::UploadTask;

/// Owns the uploads of one build invocation
///
/// Scheduling is fire-and-forget: [`schedule_upload`](Self::schedule_upload)
/// only enqueues. [`cancel_tasks`](Self::cancel_tasks) is idempotent and never
/// waits. [`await_tasks`](Self::await_tasks) settles everything scheduled.
#[async_trait]
pub trait PublishManager: Send + Sync {
    /// Whether uploads run for this invocation
    fn is_publish(&self) -> bool;

    /// Publish destinations shared by every platform of a build.
    ///
    /// `None` or an empty list means there is nowhere to publish to.
    async fn global_publish_configurations(
        &self,
        configuration: &Configuration,
    ) -> Result<Option<Vec<PublishConfiguration>>>;

    /// Enqueue one upload
    fn schedule_upload(
        &self,
        config: &PublishConfiguration,
        task: UploadTask,
        app: &AppInfo,
    ) -> Result<()>;

    /// Abort every scheduled and queued upload
    fn cancel_tasks(&self);

    /// Wait until every scheduled upload settles
    async fn await_tasks(&self) -> Result<()>;

    /// Schedule uploads for an artifact reported by the builder
    fn artifact_created(&self, event: &ArtifactCreated) -> Result<()> {
        if !self.is_publish() {
            return Ok(());
        }
        debug!(file = %event.file, destinations = event.publish.len(), "artifact created");
        for config in &event.publish {
            self.schedule_upload(
                config,
                UploadTask::new(&event.file, event.arch),
                &event.app_info,
            )?;
        }
        Ok(())
    }
}
