//! Command publisher

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use gantry_core::{
    run_cancellable, AppInfo, CancellationToken, PublishConfiguration, PublishError, Result,
};

use crate::traits::Publisher;
use crate::types::{UploadRecord, UploadTask};

/// Hands each artifact to a shell command
///
/// Options:
/// - `command` (required): shell command run in the project directory
///
/// The command sees `GANTRY_UPLOAD_FILE`, `GANTRY_UPLOAD_ARCH`,
/// `GANTRY_APP_NAME`, `GANTRY_APP_VERSION` and `GANTRY_PUBLISH_PROVIDER`.
/// The last non-empty line of its stdout is recorded as the destination.
#[derive(Debug, Clone, Default)]
pub struct CommandPublisher;

impl CommandPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Publisher for CommandPublisher {
    fn provider(&self) -> &str {
        "command"
    }

    #[instrument(skip_all, fields(file = %task.file))]
    async fn upload(
        &self,
        config: &PublishConfiguration,
        task: &UploadTask,
        app: &AppInfo,
        token: &CancellationToken,
    ) -> Result<UploadRecord> {
        let command = config.require_str("command")?;
        let failed = |message: String| PublishError::UploadFailed {
            file: task.file.clone(),
            provider: "command".to_string(),
            message,
        };

        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .current_dir(&app.project_dir)
            .env("GANTRY_UPLOAD_FILE", &task.file)
            .env(
                "GANTRY_UPLOAD_ARCH",
                task.arch.map(|a| a.as_str()).unwrap_or(""),
            )
            .env("GANTRY_APP_NAME", &app.name)
            .env("GANTRY_APP_VERSION", &app.version)
            .env("GANTRY_PUBLISH_PROVIDER", &config.provider)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command, "running publish command");
        let child = cmd.spawn().map_err(|e| failed(e.to_string()))?;

        // Dropping the pending wait on cancellation kills the child.
        let output = run_cancellable(token, async {
            child
                .wait_with_output()
                .await
                .map_err(|e| failed(e.to_string()).into())
        })
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "command exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            ))
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let destination = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(command)
            .to_string();

        info!(destination = %destination, "artifact published");
        Ok(UploadRecord::new(&task.file, self.provider(), destination))
    }
}
