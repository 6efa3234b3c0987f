//! Gantry - build and publish desktop application artifacts

mod cli;

use std::path::PathBuf;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(console_level(cli.verbose, cli.quiet));

    cli.execute()
}

/// Console verbosity when `RUST_LOG` is unset
fn console_level(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "info",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

/// Human-readable events go to stderr so stdout stays parseable with
/// `--format json`. Debug-level JSON events also go to a daily file under
/// `~/.gantry/logs` when that directory is usable.
fn init_tracing(default_level: &str) -> Option<WorkerGuard> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let (file, guard) = match gantry_log_dir() {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "gantry.log"));
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}

fn gantry_log_dir() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(".gantry").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
