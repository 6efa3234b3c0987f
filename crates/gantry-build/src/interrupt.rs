//! Scoped interrupt handling
//!
//! Each build invocation subscribes to interrupts for its own lifetime and
//! removes its subscription during finalization, so repeated builds in one
//! process never leave handlers behind.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Future resolving when an interrupt arrives
pub type InterruptSignal = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Source of external interrupts
pub trait InterruptSource: Send + Sync {
    /// Subscribe; the returned future resolves on the next interrupt
    fn subscribe(&self) -> InterruptSignal;
}

/// Ctrl-C / SIGINT
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrlC;

impl InterruptSource for CtrlC {
    fn subscribe(&self) -> InterruptSignal {
        Box::pin(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for interrupts");
                std::future::pending::<()>().await;
            }
        })
    }
}

/// An installed interrupt subscription
///
/// [`remove`](Self::remove) tears the subscription down and waits until it
/// is gone. Dropping the handler without removing it aborts the listener.
#[must_use = "an interrupt handler should be removed once the build settles"]
pub struct InterruptHandler {
    task: Option<JoinHandle<()>>,
}

impl InterruptHandler {
    /// Subscribe to `source` and run `on_interrupt` at most once
    pub fn install<F>(source: &dyn InterruptSource, on_interrupt: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let signal = source.subscribe();
        let task = tokio::spawn(async move {
            signal.await;
            on_interrupt();
        });
        debug!("interrupt handler installed");
        Self { task: Some(task) }
    }

    /// Remove the subscription
    pub async fn remove(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // A cancelled join is the expected outcome here.
            let _ = task.await;
            debug!("interrupt handler removed");
        }
    }
}

impl Drop for InterruptHandler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualInterrupt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_callback_runs_on_interrupt() {
        let source = ManualInterrupt::new();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handler = InterruptHandler::install(&source, move || {
            let _ = tx.send(());
        });
        source.trigger();

        tokio::time::timeout(std::time::Duration::from_secs(5), rx)
            .await
            .expect("interrupt callback did not run")
            .unwrap();

        handler.remove().await;
        assert_eq!(source.subscriptions(), 1);
        assert_eq!(source.active(), 0);
    }

    #[tokio::test]
    async fn test_remove_unsubscribes_without_firing() {
        let source = ManualInterrupt::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let handler = InterruptHandler::install(&source, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(source.subscriptions(), 1);

        handler.remove().await;
        source.trigger();
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.active(), 0);
    }

    #[tokio::test]
    async fn test_independent_handlers() {
        let source = ManualInterrupt::new();
        let first = InterruptHandler::install(&source, || {});
        let second = InterruptHandler::install(&source, || {});
        assert_eq!(source.active(), 2);

        first.remove().await;
        assert_eq!(source.active(), 1);
        second.remove().await;
        assert_eq!(source.active(), 0);
    }
}
