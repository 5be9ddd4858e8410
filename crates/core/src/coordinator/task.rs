use std::future::Future;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Holds at most one running task for an intent category.
///
/// Starting a new task cancels the previous one first, so only the latest
/// task can still observe an uncancelled token. Dropping the slot cancels
/// whatever is running.
#[derive(Default)]
pub(crate) struct TaskSlot {
    current: Mutex<Option<RunningTask>>,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningTask {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

impl TaskSlot {
    /// Cancel the running task (if any) and spawn `make(token)` in its place.
    pub(crate) fn replace<F, Fut>(&self, make: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.stop();
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(make(cancel.clone()));
        *current = Some(RunningTask { cancel, handle });
    }

    /// Cancel the running task, if any.
    pub(crate) fn cancel(&self) {
        if let Some(previous) = self.current.lock().take() {
            previous.stop();
        }
    }

    /// Whether a task was started and has not yet finished.
    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
