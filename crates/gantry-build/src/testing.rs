//! Test doubles for the orchestrator

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use gantry_core::{
    AppInfo, ArtifactCreated, ArtifactListener, BuildError, BuildRequest, BuildResult,
    CancellationToken, Configuration, GantryError, Platform, PublishConfiguration, PublishError,
    Result,
};
use gantry_publish::{PublishManager, UploadTask};

use crate::factory::PublishManagerFactory;
use crate::interrupt::{InterruptSignal, InterruptSource};
use crate::traits::ArtifactBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Succeed,
    Fail,
    /// Fire the interrupt, wait for cancellation, fail with `Cancelled`
    Interrupted,
    /// Fire the interrupt, wait for cancellation, report success anyway
    IgnoreInterrupt,
}

pub(crate) struct MockBuilder {
    artifacts: Vec<String>,
    configuration: Configuration,
    mode: Mode,
    invocations: AtomicUsize,
    pub interrupt: ManualInterrupt,
}

impl MockBuilder {
    fn with_mode(artifacts: &[&str], mode: Mode) -> Self {
        Self {
            artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
            configuration: Configuration::default(),
            mode,
            invocations: AtomicUsize::new(0),
            interrupt: ManualInterrupt::new(),
        }
    }

    pub fn succeeding(artifacts: &[&str]) -> Self {
        Self::with_mode(artifacts, Mode::Succeed)
    }

    pub fn failing() -> Self {
        Self::with_mode(&[], Mode::Fail)
    }

    pub fn interrupted() -> Self {
        Self::with_mode(&["app.exe"], Mode::Interrupted)
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn trigger_interrupt(mut self) -> Self {
        self.mode = Mode::IgnoreInterrupt;
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactBuilder for MockBuilder {
    async fn build(
        &self,
        _request: &BuildRequest,
        token: &CancellationToken,
        listener: &dyn ArtifactListener,
    ) -> Result<BuildResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            Mode::Succeed => {}
            Mode::Fail => {
                return Err(BuildError::CommandFailed {
                    platform: "linux".to_string(),
                    command: "make dist".to_string(),
                    exit_code: Some(2),
                    stderr: "missing icon".to_string(),
                }
                .into())
            }
            Mode::Interrupted => {
                self.interrupt.trigger();
                token.cancelled().await;
                return Err(GantryError::Cancelled);
            }
            Mode::IgnoreInterrupt => {
                self.interrupt.trigger();
                token.cancelled().await;
            }
        }

        let app = AppInfo::new("app", "1.0.0", "/tmp/gantry-mock-app");
        for file in &self.artifacts {
            listener.artifact_created(&ArtifactCreated {
                file: file.clone(),
                arch: None,
                platform: Platform::Linux,
                app_info: app.clone(),
                publish: self.configuration.publish.clone(),
            })?;
        }

        Ok(
            BuildResult::new(self.configuration.clone(), app, "/tmp/gantry-mock-app/dist")
                .with_artifacts(self.artifacts.iter().cloned()),
        )
    }
}

/// Publish manager that records calls instead of uploading
#[derive(Default)]
pub(crate) struct RecordingPublishManager {
    pub publish: bool,
    pub configurations: Option<Vec<PublishConfiguration>>,
    /// Fail scheduling once this many uploads were recorded
    pub fail_schedule_after: Option<usize>,
    /// Fail `await_tasks` with this message
    pub fail_await: Option<String>,
    pub scheduled: Mutex<Vec<(String, String)>>,
    pub cancel_calls: AtomicUsize,
    pub await_calls: AtomicUsize,
}

impl RecordingPublishManager {
    /// `(file, provider)` pairs in scheduling order
    pub fn scheduled(&self) -> Vec<(String, String)> {
        self.scheduled.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishManager for RecordingPublishManager {
    fn is_publish(&self) -> bool {
        self.publish
    }

    async fn global_publish_configurations(
        &self,
        _configuration: &Configuration,
    ) -> Result<Option<Vec<PublishConfiguration>>> {
        Ok(self.configurations.clone())
    }

    fn schedule_upload(
        &self,
        config: &PublishConfiguration,
        task: UploadTask,
        _app: &AppInfo,
    ) -> Result<()> {
        let mut scheduled = self.scheduled.lock().unwrap();
        if self.fail_schedule_after.is_some_and(|n| scheduled.len() >= n) {
            return Err(PublishError::InvalidConfiguration {
                provider: config.provider.clone(),
                message: "rejected by test".to_string(),
            }
            .into());
        }
        scheduled.push((task.file, config.provider.clone()));
        Ok(())
    }

    fn cancel_tasks(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn await_tasks(&self) -> Result<()> {
        self.await_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_await {
            Some(message) => Err(PublishError::UploadsFailed {
                failed: 1,
                total: 1,
                first: message.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Hands out the same manager for every invocation
pub(crate) struct StaticFactory(pub Arc<RecordingPublishManager>);

impl PublishManagerFactory for StaticFactory {
    fn create(
        &self,
        _request: &BuildRequest,
        _token: &CancellationToken,
    ) -> Result<Arc<dyn PublishManager>> {
        Ok(Arc::clone(&self.0) as Arc<dyn PublishManager>)
    }
}

/// Interrupt source fired by hand
#[derive(Clone)]
pub(crate) struct ManualInterrupt {
    sender: Arc<watch::Sender<bool>>,
    subscriptions: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ManualInterrupt {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            subscriptions: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Subscriptions made so far
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Subscriptions still alive
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl InterruptSource for ManualInterrupt {
    fn subscribe(&self) -> InterruptSignal {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveGuard(Arc::clone(&self.active));
        let mut rx = self.sender.subscribe();

        Box::pin(async move {
            let _guard = guard;
            let closed = rx.wait_for(|fired| *fired).await.map(|_| ()).is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        })
    }
}

/// Log sink shared with a test subscriber
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }

    /// Occurrences of `needle` in everything logged so far
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture warnings on the current thread until the guard drops
pub(crate) fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}
