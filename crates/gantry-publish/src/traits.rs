//! Publisher traits

use gantry_core::{AppInfo, CancellationToken, PublishConfiguration, Result};

use crate::types::{UploadRecord, UploadTask};

/// Trait for upload destinations
///
/// A publisher handles every [`PublishConfiguration`] whose `provider`
/// matches [`Publisher::provider`]. Uploads should stop promptly once the
/// token is cancelled.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Provider name this publisher handles
    fn provider(&self) -> &str;

    /// Upload one file
    async fn upload(
        &self,
        config: &PublishConfiguration,
        task: &UploadTask,
        app: &AppInfo,
        token: &CancellationToken,
    ) -> Result<UploadRecord>;
}
