//! A background task that must be explicitly signalled and joined.

use super::CancellationToken;
use crate::errors::ExplaidError;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// A spawned task tied to its own cancellation token.
///
/// The owner signals the task with [`cancel`](Self::cancel) and awaits its
/// completion with [`join`](Self::join) or [`finish`](Self::finish). Both
/// consume the handle, so it cannot be referenced once the task is done.
/// Dropping an un-joined handle still signals the task, but nothing waits
/// for it; owners are expected to join.
pub struct SupervisedTask<T> {
    name: String,
    token: Arc<CancellationToken>,
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> SupervisedTask<T> {
    /// Spawns `task` with a fresh cancellation token.
    pub fn spawn<F, Fut>(name: impl Into<String>, task: F) -> Self
    where
        F: FnOnce(Arc<CancellationToken>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let token = Arc::new(CancellationToken::new());
        let handle = tokio::spawn(task(token.clone()));
        Self {
            name: name.into(),
            token,
            handle: Some(handle),
        }
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns whether the task has already run to completion.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signals cancellation. Signalling twice is a no-op.
    pub fn cancel(&self, reason: &str) {
        self.token.cancel(reason);
    }

    /// Waits for the task to complete without signalling it.
    pub async fn join(mut self) -> Result<T, ExplaidError> {
        let Some(handle) = self.handle.take() else {
            return Err(ExplaidError::Internal(format!(
                "task '{}' was already joined",
                self.name
            )));
        };

        handle
            .await
            .map_err(|e| ExplaidError::Internal(format!("task '{}' join error: {e}", self.name)))
    }

    /// Signals cancellation and waits for the task to complete.
    pub async fn finish(self, reason: &str) -> Result<T, ExplaidError> {
        self.cancel(reason);
        self.join().await
    }
}

impl<T> Drop for SupervisedTask<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!(task = %self.name, "supervised task dropped without join, signalling it");
            self.token.cancel("handle dropped");
        }
    }
}

impl<T> std::fmt::Debug for SupervisedTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisedTask")
            .field("name", &self.name)
            .field("cancelled", &self.token.is_cancelled())
            .field("joined", &self.handle.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_task_join_returns_value() {
        let task = SupervisedTask::spawn("answer", |_token| async { 42 });
        assert_eq!(task.join().await.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_respects_cancellation() {
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        let task = SupervisedTask::spawn("long_task", move |token| async move {
            for _ in 0..10 {
                if token.is_cancelled() {
                    return;
                }
                counter_clone.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        // Give task time to start
        tokio::time::sleep(Duration::from_millis(25)).await;

        task.finish("manual cancel").await.unwrap();

        // Task should have stopped early
        let count = counter.load(Ordering::SeqCst);
        assert!(count < 10);
    }

    #[tokio::test]
    async fn test_task_panic_is_reported() {
        let task = SupervisedTask::spawn("panics", |_token| async {
            panic!("Intentional");
        });

        let err = task.join().await.unwrap_err();
        assert!(err.to_string().contains("panics"));
    }

    #[tokio::test]
    async fn test_drop_signals_token() {
        let task = SupervisedTask::spawn("dropped", |token| async move {
            token.cancelled().await;
        });
        let token = task.token.clone();
        drop(task);

        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_twice_is_noop() {
        let task = SupervisedTask::spawn("idle", |token| async move {
            token.cancelled().await;
            token.reason()
        });
        task.cancel("first");
        task.cancel("second");

        assert_eq!(task.join().await.unwrap(), Some("first".to_string()));
    }
}
