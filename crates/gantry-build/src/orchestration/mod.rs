//! Build-and-publish orchestration
//!
//! One [`Orchestrator::build`] call validates the request, drives the
//! artifact builder, runs the `afterAllArtifactBuild` hook, schedules uploads
//! for artifacts the hook contributed, and finally either waits for or
//! cancels every upload. An interrupt arriving at any point cancels the
//! shared token and every upload scheduled so far.

mod config;

pub use config::OrchestratorConfig;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use gantry_core::config::AFTER_ALL_ARTIFACT_BUILD;
use gantry_core::{
    check_cancelled, run_cancellable, ArtifactCreated, ArtifactListener, BuildOptions,
    BuildRequest, BuildResult, CancellationToken, DefaultHookResolver, HookResolver, Result,
};
use gantry_publish::{PublishManager, UploadTask};

use crate::factory::{DefaultPublishManagerFactory, PublishManagerFactory};
use crate::interrupt::{CtrlC, InterruptHandler, InterruptSource};
use crate::traits::ArtifactBuilder;

/// Forwards builder artifact events to the publish manager
struct PublishListener<'a> {
    manager: &'a dyn PublishManager,
}

impl ArtifactListener for PublishListener<'_> {
    fn artifact_created(&self, event: &ArtifactCreated) -> Result<()> {
        self.manager.artifact_created(event)
    }
}

/// Drives one build invocation from request to settled uploads
pub struct Orchestrator {
    builder: Arc<dyn ArtifactBuilder>,
    hooks: Arc<dyn HookResolver>,
    publishers: Arc<dyn PublishManagerFactory>,
    interrupts: Arc<dyn InterruptSource>,
}

impl Orchestrator {
    /// Orchestrator with the default hook resolver, publishers from the
    /// environment, and Ctrl-C as the interrupt source
    pub fn new(builder: Arc<dyn ArtifactBuilder>) -> Self {
        Self {
            builder,
            hooks: Arc::new(DefaultHookResolver::new()),
            publishers: Arc::new(DefaultPublishManagerFactory::from_env()),
            interrupts: Arc::new(CtrlC),
        }
    }

    /// Set the hook resolver
    pub fn with_hook_resolver(mut self, hooks: Arc<dyn HookResolver>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the publish manager factory
    pub fn with_publish_manager_factory(mut self, publishers: Arc<dyn PublishManagerFactory>) -> Self {
        self.publishers = publishers;
        self
    }

    /// Set the interrupt source
    pub fn with_interrupt_source(mut self, interrupts: Arc<dyn InterruptSource>) -> Self {
        self.interrupts = interrupts;
        self
    }

    /// Build and publish; returns every artifact path in production order.
    ///
    /// Option validation happens before anything else, so a rejected request
    /// never reaches the builder and never subscribes to interrupts.
    #[instrument(skip_all, fields(options = options.len()))]
    pub async fn build(&self, options: &BuildOptions) -> Result<Vec<String>> {
        let request = BuildRequest::from_options(options)?;

        let token = CancellationToken::new();
        let publish_manager = self.publishers.create(&request, &token)?;

        let handler = {
            let token = token.clone();
            let publish_manager = Arc::clone(&publish_manager);
            InterruptHandler::install(self.interrupts.as_ref(), move || {
                warn!("cancelled by interrupt");
                token.cancel();
                publish_manager.cancel_tasks();
            })
        };

        let outcome = self
            .run_stages(&request, &token, publish_manager.as_ref())
            .await;
        let finalized = finalize(publish_manager.as_ref(), outcome.is_err()).await;
        handler.remove().await;

        match (outcome, finalized) {
            (Ok(paths), Ok(())) => {
                info!(artifacts = paths.len(), "build finished");
                Ok(paths)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(finalize_error)) => {
                warn!(error = %finalize_error, "finalization failed after an earlier error");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &BuildRequest,
        token: &CancellationToken,
        publish_manager: &dyn PublishManager,
    ) -> Result<Vec<String>> {
        let listener = PublishListener {
            manager: publish_manager,
        };
        let mut result = self.builder.build(request, token, &listener).await?;
        check_cancelled(token)?;
        debug!(artifacts = result.artifact_paths.len(), "builder settled");

        let Some(spec) = result.configuration.after_all_artifact_build.clone() else {
            return Ok(result.artifact_paths);
        };
        let Some(hook) = self
            .hooks
            .resolve(&result.app_info, &spec, AFTER_ALL_ARTIFACT_BUILD)
            .await?
        else {
            return Ok(result.artifact_paths);
        };

        debug!(hook = spec.display_name(), "running {} hook", AFTER_ALL_ARTIFACT_BUILD);
        let new_artifacts = run_cancellable(token, hook.run(&result)).await?.into_paths();
        check_cancelled(token)?;

        schedule_new_artifacts(publish_manager, &mut result, new_artifacts).await?;
        Ok(result.artifact_paths)
    }
}

/// Append hook artifacts to the result and schedule their uploads.
///
/// Nothing changes unless publishing is enabled and at least one global
/// publish configuration exists. An artifact already listed is skipped.
async fn schedule_new_artifacts(
    publish_manager: &dyn PublishManager,
    result: &mut BuildResult,
    new_artifacts: Vec<String>,
) -> Result<()> {
    if new_artifacts.is_empty() || !publish_manager.is_publish() {
        return Ok(());
    }

    let configurations = match publish_manager
        .global_publish_configurations(&result.configuration)
        .await?
    {
        Some(configurations) if !configurations.is_empty() => configurations,
        _ => return Ok(()),
    };

    for file in new_artifacts {
        if result.contains_artifact(&file) {
            warn!(file = %file, "skipping publish of artifact, already listed in build result");
            continue;
        }

        result.artifact_paths.push(file.clone());
        for configuration in &configurations {
            publish_manager.schedule_upload(
                configuration,
                UploadTask::new(&file, None),
                &result.app_info,
            )?;
        }
    }

    Ok(())
}

/// Settle uploads: cancel after a failure, wait otherwise
async fn finalize(publish_manager: &dyn PublishManager, failed: bool) -> Result<()> {
    if failed {
        publish_manager.cancel_tasks();
        Ok(())
    } else {
        publish_manager.await_tasks().await
    }
}
