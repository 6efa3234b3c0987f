//! Command-driven artifact builder
//!
//! Each platform block names a shell command that packages the application
//! into the output directory. The builder runs those commands and collects
//! whatever they produced.

use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use gantry_core::config::resolve_configuration;
use gantry_core::{
    check_cancelled, run_cancellable, AppInfo, ArtifactCreated, ArtifactListener, BuildError,
    BuildRequest, BuildResult, CancellationToken, Platform, Result,
};

use crate::artifacts::{artifact_patterns, collect_artifacts, infer_arch, OutputSnapshot};
use crate::traits::ArtifactBuilder;

/// Builds artifacts by running the configured platform commands
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder;

impl CommandBuilder {
    pub fn new() -> Self {
        Self
    }
}

struct PlatformRun<'a> {
    platform: Platform,
    targets: &'a [String],
    command: &'a str,
    out_dir: &'a Path,
    app: &'a AppInfo,
    prepackaged: Option<&'a Path>,
}

#[instrument(skip_all, fields(platform = %run.platform))]
async fn run_platform_command(run: PlatformRun<'_>, token: &CancellationToken) -> Result<()> {
    let shell = if cfg!(windows) { "cmd" } else { "sh" };
    let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

    let mut cmd = Command::new(shell);
    cmd.arg(shell_arg)
        .arg(run.command)
        .current_dir(&run.app.project_dir)
        .env("GANTRY_PLATFORM", run.platform.as_str())
        .env("GANTRY_TARGETS", run.targets.join(","))
        .env("GANTRY_OUT_DIR", run.out_dir)
        .env("GANTRY_APP_NAME", &run.app.name)
        .env("GANTRY_APP_VERSION", &run.app.version)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(prepackaged) = run.prepackaged {
        cmd.env("GANTRY_PREPACKAGED", prepackaged);
    }

    info!(command = run.command, targets = ?run.targets, "running build command");
    let child = cmd.spawn().map_err(|e| BuildError::SpawnFailed {
        command: run.command.to_string(),
        message: e.to_string(),
    })?;

    let output = run_cancellable(token, async {
        child
            .wait_with_output()
            .await
            .map_err(|e| BuildError::Io(e).into())
    })
    .await?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(target: "gantry::build::command", "{}", line);
    }

    if !output.status.success() {
        return Err(BuildError::CommandFailed {
            platform: run.platform.to_string(),
            command: run.command.to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(())
}

#[async_trait]
impl ArtifactBuilder for CommandBuilder {
    #[instrument(skip_all)]
    async fn build(
        &self,
        request: &BuildRequest,
        token: &CancellationToken,
        listener: &dyn ArtifactListener,
    ) -> Result<BuildResult> {
        let resolved = resolve_configuration(request)?;
        let config = resolved.configuration;
        let project_dir = resolved.project_dir;
        let app = config.app_info(&project_dir);
        let out_dir = config.output_dir(&project_dir);

        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(BuildError::Io)?;

        let selection = request.target_selection(&config);
        let mut result = BuildResult::new(config.clone(), app.clone(), &out_dir);
        let mut seen = HashSet::new();

        for (platform, targets) in selection {
            check_cancelled(token)?;
            let block = config.platform(platform);
            let patterns = artifact_patterns(&block.artifacts, &targets);

            let before = match (block.command.as_deref(), request.prepackaged.as_deref()) {
                (Some(command), prepackaged) => {
                    let before = OutputSnapshot::capture(&out_dir, &patterns)?;
                    run_platform_command(
                        PlatformRun {
                            platform,
                            targets: &targets,
                            command,
                            out_dir: &out_dir,
                            app: &app,
                            prepackaged,
                        },
                        token,
                    )
                    .await?;
                    Some(before)
                }
                (None, Some(prepackaged)) => {
                    debug!(
                        %platform,
                        prepackaged = %prepackaged.display(),
                        "no build command, collecting prepackaged artifacts"
                    );
                    None
                }
                (None, None) => return Err(BuildError::MissingCommand(platform.to_string()).into()),
            };

            let produced = collect_artifacts(&out_dir, &patterns, before.as_ref(), &mut seen)?;
            if produced.is_empty() {
                return Err(BuildError::NoArtifacts {
                    platform: platform.to_string(),
                    out_dir: out_dir.clone(),
                }
                .into());
            }

            let publish = config.publish_for(platform).to_vec();
            for path in produced {
                let file = path.to_string_lossy().to_string();
                listener.artifact_created(&ArtifactCreated {
                    file: file.clone(),
                    arch: infer_arch(&path),
                    platform,
                    app_info: app.clone(),
                    publish: publish.clone(),
                })?;
                result.artifact_paths.push(file);
            }

            info!(%platform, artifacts = result.artifact_paths.len(), "platform built");
        }

        Ok(result)
    }
}
