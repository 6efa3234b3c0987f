//! Hooks implemented as scripts in the project

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{HookError, Result};
use crate::types::BuildResult;

use super::{ArtifactHook, HookOutput};

/// Runs a script and reads artifact paths from its stdout.
///
/// The script receives a JSON summary of the build on stdin. Its stdout is
/// read as a JSON string, a JSON array of strings, or one path per line.
#[derive(Debug, Clone)]
pub struct CommandHook {
    label: String,
    name: String,
    path: PathBuf,
}

impl CommandHook {
    pub fn new(label: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    fn command(&self) -> Command {
        #[cfg(unix)]
        let executable = {
            use std::os::unix::fs::PermissionsExt;
            std::fs::metadata(&self.path)
                .map(|m| m.permissions().mode() & 0o111 != 0)
                .unwrap_or(false)
        };
        #[cfg(not(unix))]
        let executable = false;

        if executable {
            return Command::new(&self.path);
        }

        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            Command::new("sh")
        };
        cmd.arg(&self.path);
        cmd
    }

    fn failed(&self, message: impl Into<String>) -> HookError {
        HookError::ExecutionFailed {
            label: self.label.clone(),
            name: self.name.clone(),
            message: message.into(),
        }
    }

    fn parse_output(&self, stdout: &str) -> Result<HookOutput> {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(HookOutput::None);
        }

        if trimmed.starts_with('[') || trimmed.starts_with('"') {
            let invalid = |message: String| HookError::InvalidOutput {
                label: self.label.clone(),
                name: self.name.clone(),
                message,
            };
            return match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::String(path)) => Ok(HookOutput::Single(path)),
                Ok(Value::Array(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(path) => Ok(path),
                        other => Err(invalid(format!("expected a path, got {}", other)).into()),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(HookOutput::Many),
                Ok(other) => Err(invalid(format!("expected a path or a list, got {}", other)).into()),
                Err(e) => Err(invalid(e.to_string()).into()),
            };
        }

        Ok(HookOutput::Many(
            trimmed
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}

#[async_trait]
impl ArtifactHook for CommandHook {
    #[instrument(skip(self, result), fields(hook = %self.name))]
    async fn run(&self, result: &BuildResult) -> Result<HookOutput> {
        let summary = json!({
            "artifactPaths": result.artifact_paths,
            "outDir": result.out_dir,
            "appInfo": result.app_info,
            "configuration": result.configuration,
        });

        let mut cmd = self.command();
        cmd.current_dir(&result.app_info.project_dir)
            .env("GANTRY_HOOK", &self.label)
            .env("GANTRY_OUT_DIR", &result.out_dir)
            .env("GANTRY_APP_NAME", &result.app_info.name)
            .env("GANTRY_APP_VERSION", &result.app_info.version)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| self.failed(e.to_string()))?;

        // Fed while output is drained, so neither pipe can fill up and stall the hook.
        let stdin = child.stdin.take();
        let payload = summary.to_string();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // Scripts that never read stdin close the pipe early.
                if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                    debug!(error = %e, "hook did not consume build summary");
                }
            }
        };

        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| self.failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self
                .failed(format!(
                    "exited with {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ))
                .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = self.parse_output(&stdout)?;
        debug!(artifacts = ?parsed, "hook finished");
        Ok(parsed)
    }
}
