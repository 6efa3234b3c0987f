//! Validate command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use gantry_core::config::{load_config, load_config_from_dir};
use gantry_core::{Configuration, Platform};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Validate the project configuration
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Configuration file to validate instead of the discovered one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(config = ?self.config, strict = self.strict, "executing validate command");
        let cwd = std::env::current_dir()?;

        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        let loaded = match &self.config {
            Some(path) => load_config(&cwd.join(path)).map(|c| (c, cwd.join(path))),
            None => load_config_from_dir(&cwd),
        };
        let (config, config_path) = match loaded {
            Ok((c, p)) => (Some(c), Some(p)),
            Err(e) => {
                errors.push(format!("Configuration: {}", e));
                (None, None)
            }
        };

        if let Some(ref cfg) = config {
            warnings.extend(configuration_warnings(cfg));
        }

        if self.strict {
            errors.append(&mut warnings);
        }

        let passed = errors.is_empty();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.map(|p| p.to_string_lossy().to_string()),
                    "errors": errors,
                    "warnings": warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", style("Validation Results").bold());
                    println!();

                    if let Some(path) = config_path {
                        println!("Config: {}", output::path_style().apply_to(path.display()));
                    }
                    if let Some(ref cfg) = config {
                        print_summary(cfg);
                    }
                    println!();

                    if !errors.is_empty() {
                        println!("{}", style("Errors:").red().bold());
                        for error in &errors {
                            println!("  {} {}", style("✗").red(), error);
                        }
                        println!();
                    }

                    for warning in &warnings {
                        output::warning(warning);
                    }

                    if passed {
                        output::success("Configuration is valid");
                    } else {
                        println!(
                            "{} with {} error(s)",
                            style("✗ Validation failed").red().bold(),
                            errors.len()
                        );
                    }
                }
            }
        }

        if !passed {
            std::process::exit(2);
        }

        Ok(())
    }
}

fn print_summary(config: &Configuration) {
    let name = config.name.as_deref().unwrap_or("(unnamed)");
    let version = config.version.as_deref().unwrap_or("(unset)");
    println!("{}", output::key_value("App", &format!("{} {}", name, version)));

    for &platform in Platform::all() {
        let targets = config.targets_for(platform);
        let publish: Vec<&str> = config
            .publish_for(platform)
            .iter()
            .map(|p| p.provider.as_str())
            .collect();
        println!(
            "{}",
            output::key_value(
                platform.as_str(),
                &format!("targets [{}], publish [{}]", targets.join(", "), publish.join(", "))
            )
        );
    }
}

/// Problems that do not stop a build but likely surprise
fn configuration_warnings(config: &Configuration) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.version.is_none() {
        warnings.push("No version set, builds will use 0.0.0".to_string());
    }
    for &platform in Platform::all() {
        if config.platform(platform).command.is_none() {
            warnings.push(format!(
                "No build command for {}, only prepackaged builds are possible",
                platform
            ));
        }
    }
    if config.publish.is_empty() {
        warnings.push("No publish destinations configured".to_string());
    }

    warnings
}
