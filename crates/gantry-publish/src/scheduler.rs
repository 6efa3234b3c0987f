//! Upload scheduler, the concrete publish manager

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use gantry_core::{
    AppInfo, CancellationToken, Configuration, GantryError, PublishConfiguration, PublishError,
    Result,
};

use crate::manager::PublishManager;
use crate::registry::PublisherRegistry;
use crate::types::{UploadOutcome, UploadRecord, UploadTask};

/// Default number of uploads running at once
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// Options for the upload scheduler
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum concurrent uploads
    pub concurrency: usize,
    /// Whether uploads run at all
    pub publish: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            publish: false,
        }
    }
}

/// Runs uploads in the background with bounded concurrency
///
/// Every upload observes a child of the invocation's cancellation token, so
/// cancelling the invocation or calling [`PublishManager::cancel_tasks`]
/// stops uploads that are queued or running.
pub struct UploadScheduler {
    registry: Arc<PublisherRegistry>,
    options: SchedulerOptions,
    token: CancellationToken,
    semaphore: Arc<Semaphore>,
    tasks: Mutex<JoinSet<UploadOutcome>>,
    outcomes: Mutex<Vec<UploadOutcome>>,
    scheduled: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl UploadScheduler {
    /// Create a scheduler bound to an invocation's cancellation token
    pub fn new(
        registry: Arc<PublisherRegistry>,
        token: &CancellationToken,
        options: SchedulerOptions,
    ) -> Self {
        let concurrency = options.concurrency.max(1);
        Self {
            registry,
            token: token.child_token(),
            semaphore: Arc::new(Semaphore::new(concurrency)),
            options,
            tasks: Mutex::new(JoinSet::new()),
            outcomes: Mutex::new(Vec::new()),
            scheduled: AtomicUsize::new(0),
        }
    }

    /// Number of uploads scheduled so far
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Outcomes of settled uploads, in settle order
    pub fn outcomes(&self) -> Vec<UploadOutcome> {
        lock(&self.outcomes).clone()
    }

    /// Records of completed uploads
    pub fn completed(&self) -> Vec<UploadRecord> {
        lock(&self.outcomes)
            .iter()
            .filter_map(|o| match o {
                UploadOutcome::Completed(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PublishManager for UploadScheduler {
    fn is_publish(&self) -> bool {
        self.options.publish
    }

    async fn global_publish_configurations(
        &self,
        configuration: &Configuration,
    ) -> Result<Option<Vec<PublishConfiguration>>> {
        if configuration.publish.is_empty() {
            Ok(None)
        } else {
            Ok(Some(configuration.publish.clone()))
        }
    }

    fn schedule_upload(
        &self,
        config: &PublishConfiguration,
        task: UploadTask,
        app: &AppInfo,
    ) -> Result<()> {
        let publisher = self.registry.require(&config.provider)?;
        let config = config.clone();
        let app = app.clone();
        let token = self.token.clone();
        let semaphore = Arc::clone(&self.semaphore);

        debug!(file = %task.file, provider = %config.provider, "scheduling upload");
        self.scheduled.fetch_add(1, Ordering::SeqCst);

        lock(&self.tasks).spawn(async move {
            let cancelled = |task: UploadTask, config: PublishConfiguration| UploadOutcome::Cancelled {
                file: task.file,
                provider: config.provider,
            };

            let _permit = tokio::select! {
                biased;
                _ = token.cancelled() => return cancelled(task, config),
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return cancelled(task, config),
                },
            };

            match publisher.upload(&config, &task, &app, &token).await {
                Ok(record) => UploadOutcome::Completed(record),
                Err(e) if e.is_cancelled() => cancelled(task, config),
                Err(e) => UploadOutcome::Failed {
                    file: task.file,
                    provider: config.provider,
                    message: e.to_string(),
                },
            }
        });

        Ok(())
    }

    fn cancel_tasks(&self) {
        if !self.token.is_cancelled() {
            debug!(scheduled = self.scheduled_count(), "cancelling uploads");
        }
        self.token.cancel();
        lock(&self.tasks).abort_all();
    }

    async fn await_tasks(&self) -> Result<()> {
        let mut failures = Vec::new();
        let mut cancelled = 0usize;
        let mut panicked = None;
        let mut settled = 0usize;

        // Uploads scheduled while draining land in a fresh set and are
        // picked up by the next round.
        loop {
            let mut set = std::mem::take(&mut *lock(&self.tasks));
            if set.is_empty() {
                break;
            }

            while let Some(joined) = set.join_next().await {
                settled += 1;
                match joined {
                    Ok(outcome) => {
                        match outcome {
                            UploadOutcome::Completed(ref record) => {
                                info!(file = %record.file, provider = %record.provider, "upload finished");
                            }
                            UploadOutcome::Failed {
                                ref file,
                                ref provider,
                                ref message,
                            } => {
                                warn!(file = %file, provider = %provider, error = %message, "upload failed");
                                failures.push(format!("{} ({}): {}", file, provider, message));
                            }
                            UploadOutcome::Cancelled { .. } => cancelled += 1,
                        }
                        lock(&self.outcomes).push(outcome);
                    }
                    Err(e) if e.is_cancelled() => cancelled += 1,
                    Err(e) => {
                        warn!(error = %e, "upload task panicked");
                        panicked.get_or_insert_with(|| e.to_string());
                    }
                }
            }
        }

        debug!(settled, failed = failures.len(), cancelled, "uploads settled");

        if let Some(first) = failures.first() {
            return Err(PublishError::UploadsFailed {
                failed: failures.len(),
                total: settled,
                first: first.clone(),
            }
            .into());
        }
        if let Some(message) = panicked {
            return Err(PublishError::TaskPanicked(message).into());
        }
        if cancelled > 0 {
            return Err(GantryError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Publisher;
    use std::time::Duration;

    /// Publisher that records uploads and optionally waits or fails
    #[derive(Default)]
    struct TestPublisher {
        delay: Option<Duration>,
        fail_on: Option<String>,
        running: AtomicUsize,
        max_running: AtomicUsize,
        uploaded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Publisher for TestPublisher {
        fn provider(&self) -> &str {
            "test"
        }

        async fn upload(
            &self,
            _config: &PublishConfiguration,
            task: &UploadTask,
            _app: &AppInfo,
            token: &CancellationToken,
        ) -> Result<UploadRecord> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                let waited = gantry_core::run_cancellable(token, async {
                    tokio::time::sleep(delay).await;
                    Ok(())
                })
                .await;
                if let Err(e) = waited {
                    self.running.fetch_sub(1, Ordering::SeqCst);
                    return Err(e);
                }
            }
            self.running.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.as_deref() == Some(task.file.as_str()) {
                return Err(GantryError::other("server said no"));
            }
            lock(&self.uploaded).push(task.file.clone());
            Ok(UploadRecord::new(&task.file, "test", format!("test://{}", task.file)))
        }
    }

    fn scheduler(publisher: Arc<TestPublisher>, concurrency: usize) -> UploadScheduler {
        let mut registry = PublisherRegistry::new();
        registry.register_arc(publisher);
        UploadScheduler::new(
            Arc::new(registry),
            &CancellationToken::new(),
            SchedulerOptions {
                concurrency,
                publish: true,
            },
        )
    }

    fn app() -> AppInfo {
        AppInfo::new("app", "1.0.0", "/tmp/app")
    }

    #[tokio::test]
    async fn test_await_tasks_runs_all_uploads() {
        let publisher = Arc::new(TestPublisher::default());
        let scheduler = scheduler(Arc::clone(&publisher), 2);
        let config = PublishConfiguration::new("test");

        for file in ["a.zip", "b.zip", "c.zip"] {
            scheduler
                .schedule_upload(&config, UploadTask::new(file, None), &app())
                .unwrap();
        }
        scheduler.await_tasks().await.unwrap();

        let mut uploaded = lock(&publisher.uploaded).clone();
        uploaded.sort();
        assert_eq!(uploaded, vec!["a.zip", "b.zip", "c.zip"]);
        assert_eq!(scheduler.completed().len(), 3);
        assert_eq!(scheduler.scheduled_count(), 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let publisher = Arc::new(TestPublisher {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let scheduler = scheduler(Arc::clone(&publisher), 2);
        let config = PublishConfiguration::new("test");

        for i in 0..6 {
            scheduler
                .schedule_upload(&config, UploadTask::new(format!("{}.zip", i), None), &app())
                .unwrap();
        }
        scheduler.await_tasks().await.unwrap();
        assert!(publisher.max_running.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_scheduling_error() {
        let scheduler = scheduler(Arc::new(TestPublisher::default()), 1);
        let err = scheduler
            .schedule_upload(
                &PublishConfiguration::new("bintray"),
                UploadTask::new("a.zip", None),
                &app(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("bintray"));
        assert_eq!(scheduler.scheduled_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_surfaces_from_await() {
        let publisher = Arc::new(TestPublisher {
            fail_on: Some("b.zip".to_string()),
            ..Default::default()
        });
        let scheduler = scheduler(publisher, 4);
        let config = PublishConfiguration::new("test");
        for file in ["a.zip", "b.zip"] {
            scheduler
                .schedule_upload(&config, UploadTask::new(file, None), &app())
                .unwrap();
        }

        let err = scheduler.await_tasks().await.unwrap_err();
        assert!(err.to_string().contains("1 of 2 uploads failed"), "{}", err);
        assert!(err.to_string().contains("server said no"));
    }

    #[tokio::test]
    async fn test_cancel_tasks_stops_pending_uploads() {
        let publisher = Arc::new(TestPublisher {
            delay: Some(Duration::from_secs(3600)),
            ..Default::default()
        });
        let scheduler = scheduler(Arc::clone(&publisher), 1);
        let config = PublishConfiguration::new("test");
        for file in ["a.zip", "b.zip"] {
            scheduler
                .schedule_upload(&config, UploadTask::new(file, None), &app())
                .unwrap();
        }

        scheduler.cancel_tasks();
        scheduler.cancel_tasks();

        let result = tokio::time::timeout(Duration::from_secs(5), scheduler.await_tasks())
            .await
            .expect("await_tasks hung after cancel");
        assert!(result.unwrap_err().is_cancelled());
        assert!(lock(&publisher.uploaded).is_empty());
    }

    #[tokio::test]
    async fn test_parent_token_cancels_uploads() {
        let publisher = Arc::new(TestPublisher {
            delay: Some(Duration::from_secs(3600)),
            ..Default::default()
        });
        let mut registry = PublisherRegistry::new();
        registry.register_arc(publisher);
        let parent = CancellationToken::new();
        let scheduler = UploadScheduler::new(
            Arc::new(registry),
            &parent,
            SchedulerOptions {
                concurrency: 1,
                publish: true,
            },
        );
        scheduler
            .schedule_upload(&PublishConfiguration::new("test"), UploadTask::new("a.zip", None), &app())
            .unwrap();

        parent.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), scheduler.await_tasks())
            .await
            .expect("await_tasks hung after parent cancel");
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_await_with_nothing_scheduled() {
        let scheduler = scheduler(Arc::new(TestPublisher::default()), 1);
        scheduler.await_tasks().await.unwrap();
        assert!(scheduler.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_global_publish_configurations() {
        let scheduler = scheduler(Arc::new(TestPublisher::default()), 1);
        let mut config = Configuration::default();
        assert!(scheduler
            .global_publish_configurations(&config)
            .await
            .unwrap()
            .is_none());

        config.publish = vec![PublishConfiguration::new("test")];
        let configs = scheduler
            .global_publish_configurations(&config)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(configs.len(), 1);
    }

    #[tokio::test]
    async fn test_artifact_created_schedules_per_destination() {
        let publisher = Arc::new(TestPublisher::default());
        let scheduler = scheduler(Arc::clone(&publisher), 2);
        let event = gantry_core::ArtifactCreated {
            file: "dist/app.dmg".to_string(),
            arch: Some(gantry_core::Arch::Arm64),
            platform: gantry_core::Platform::Mac,
            app_info: app(),
            publish: vec![PublishConfiguration::new("test"), PublishConfiguration::new("test")],
        };

        scheduler.artifact_created(&event).unwrap();
        assert_eq!(scheduler.scheduled_count(), 2);
        scheduler.await_tasks().await.unwrap();
    }
}
