//! Fire-and-forget execution of background cache writes.

use std::sync::Mutex;

use futures::future::{join_all, BoxFuture};

/// A detached unit of background work.
pub type BackgroundTask = BoxFuture<'static, ()>;

/// Runs background work without the caller awaiting it.
///
/// Tasks must swallow their own failures; a spawner never reports back.
pub trait TaskSpawner: Send + Sync {
    /// Schedule a task.
    fn spawn(&self, task: BackgroundTask);
}

/// Spawns onto the ambient tokio runtime.
///
/// Outside a runtime the task is dropped, which abandons the write.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

#[cfg(not(target_arch = "wasm32"))]
impl TaskSpawner for TokioSpawner {
    fn spawn(&self, task: BackgroundTask) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                tracing::warn!("no tokio runtime, dropping background task");
            }
        }
    }
}

/// Collects tasks to run once the response has been sent.
///
/// For single-request runtimes (Spin components) that keep executing after
/// the response is handed off but offer no detached spawn. Dropping the
/// collector without draining abandons the pending tasks.
#[derive(Default)]
pub struct DeferredTasks {
    tasks: Mutex<Vec<BackgroundTask>>,
}

impl DeferredTasks {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Run every pending task concurrently to completion.
    pub async fn drain(&self) {
        let tasks = std::mem::take(&mut *self.lock());
        if tasks.is_empty() {
            return;
        }
        join_all(tasks).await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<BackgroundTask>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TaskSpawner for DeferredTasks {
    fn spawn(&self, task: BackgroundTask) {
        self.lock().push(task);
    }
}

impl std::fmt::Debug for DeferredTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTasks")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> BackgroundTask {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_deferred_tasks_wait_for_drain() {
        let counter = Arc::new(AtomicUsize::new(0));
        let tasks = DeferredTasks::new();

        tasks.spawn(counting_task(&counter));
        tasks.spawn(counting_task(&counter));
        assert_eq!(tasks.pending(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tasks.drain().await;
        assert_eq!(tasks.pending(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_drain_empty_is_noop() {
        DeferredTasks::new().drain().await;
    }

    #[tokio::test]
    async fn test_tokio_spawner_runs_detached() {
        let counter = Arc::new(AtomicUsize::new(0));
        TokioSpawner.spawn(counting_task(&counter));

        for _ in 0..50 {
            if counter.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tokio_spawner_without_runtime_drops_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        TokioSpawner.spawn(counting_task(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
