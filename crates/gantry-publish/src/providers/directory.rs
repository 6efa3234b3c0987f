//! Directory publisher

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use gantry_core::{
    run_cancellable, AppInfo, CancellationToken, PublishConfiguration, PublishError, Result,
};

use crate::traits::Publisher;
use crate::types::{UploadRecord, UploadTask};

/// Copies artifacts into `<path>/<version>/`
///
/// Options:
/// - `path` (required): destination root, relative to the project directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryPublisher;

impl DirectoryPublisher {
    pub fn new() -> Self {
        Self
    }

    fn destination_dir(config: &PublishConfiguration, app: &AppInfo) -> Result<PathBuf> {
        let root = config.require_str("path")?;
        Ok(app.project_dir.join(root).join(&app.version))
    }
}

fn resolve_source(file: &str, project_dir: &Path) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

#[async_trait::async_trait]
impl Publisher for DirectoryPublisher {
    fn provider(&self) -> &str {
        "directory"
    }

    #[instrument(skip_all, fields(file = %task.file))]
    async fn upload(
        &self,
        config: &PublishConfiguration,
        task: &UploadTask,
        app: &AppInfo,
        token: &CancellationToken,
    ) -> Result<UploadRecord> {
        let source = resolve_source(&task.file, &app.project_dir);
        let file_name = source.file_name().ok_or_else(|| PublishError::UploadFailed {
            file: task.file.clone(),
            provider: self.provider().to_string(),
            message: "artifact path has no file name".to_string(),
        })?;

        let dest_dir = Self::destination_dir(config, app)?;
        let dest = dest_dir.join(file_name);
        debug!(source = %source.display(), dest = %dest.display(), "copying artifact");

        let failed = |e: std::io::Error| PublishError::UploadFailed {
            file: task.file.clone(),
            provider: "directory".to_string(),
            message: e.to_string(),
        };

        run_cancellable(token, async {
            tokio::fs::create_dir_all(&dest_dir).await.map_err(failed)?;
            tokio::fs::copy(&source, &dest).await.map_err(failed)?;
            Ok(())
        })
        .await?;

        info!(dest = %dest.display(), "artifact published");
        Ok(UploadRecord::new(
            &task.file,
            self.provider(),
            dest.to_string_lossy(),
        ))
    }
}
