//! Build command - build artifacts for the selected platforms and publish them

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use serde_json::{json, Value};
use tracing::info;

use gantry_build::{CommandBuilder, Orchestrator};
use gantry_core::{BuildOptions, GantryError};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Build artifacts for one or more platforms
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Build for macOS, optionally naming the targets
    #[arg(long, num_args = 0.., value_name = "TARGET")]
    pub mac: Option<Vec<String>>,

    /// Build for Windows, optionally naming the targets
    #[arg(long, num_args = 0.., value_name = "TARGET")]
    pub win: Option<Vec<String>>,

    /// Build for Linux, optionally naming the targets
    #[arg(long, num_args = 0.., value_name = "TARGET")]
    pub linux: Option<Vec<String>>,

    /// Publish policy: always, never or onTag
    #[arg(short, long, value_name = "POLICY")]
    pub publish: Option<String>,

    /// Configuration file, relative to the project directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project directory (default: current directory)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Directory holding an already packaged application
    #[arg(long)]
    pub prepackaged: Option<PathBuf>,
}

impl BuildCommand {
    /// Translate the flags into orchestrator options
    pub fn to_options(&self) -> BuildOptions {
        let mut options = BuildOptions::new();

        for (key, targets) in [("mac", &self.mac), ("win", &self.win), ("linux", &self.linux)] {
            if let Some(targets) = targets {
                options.insert(key.to_string(), json!(targets));
            }
        }
        if let Some(publish) = &self.publish {
            options.insert("publish".to_string(), Value::String(publish.clone()));
        }
        if let Some(config) = &self.config {
            options.insert("config".to_string(), json!(config));
        }
        if let Some(project) = &self.project {
            options.insert("projectDir".to_string(), json!(project));
        }
        if let Some(prepackaged) = &self.prepackaged {
            options.insert("prepackaged".to_string(), json!(prepackaged));
        }

        options
    }

    /// Execute the build command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let options = self.to_options();
        info!(options = ?options.keys().collect::<Vec<_>>(), "executing build command");

        let runtime = tokio::runtime::Runtime::new()?;
        let orchestrator = Orchestrator::new(Arc::new(CommandBuilder::new()));

        match runtime.block_on(orchestrator.build(&options)) {
            Ok(artifacts) => {
                self.report_success(cli, &artifacts)?;
                Ok(())
            }
            Err(e) => {
                report_failure(cli, &e)?;
                std::process::exit(e.exit_code());
            }
        }
    }

    fn report_success(&self, cli: &Cli, artifacts: &[String]) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let output = json!({
                    "success": true,
                    "artifacts": artifacts,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!("Built {} artifact(s)", artifacts.len()));
                    for artifact in artifacts {
                        println!("  {}", output::path_style().apply_to(artifact));
                    }
                }
            }
        }
        Ok(())
    }
}

fn report_failure(cli: &Cli, error: &GantryError) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let output = json!({
                "success": false,
                "cancelled": error.is_cancelled(),
                "error": error.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text if error.is_cancelled() => {
            eprintln!("{}", style("Build cancelled").yellow().bold());
        }
        OutputFormat::Text => output::error(&error.to_string()),
    }
    Ok(())
}
