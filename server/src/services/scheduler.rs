//! Cancellable scheduled tasks.
//!
//! DESIGN
//! ======
//! A `ScheduledTask` is a spawned tokio task that is aborted when cancelled
//! or dropped. A `TaskSlot` holds at most one of them: scheduling into an
//! occupied slot cancels the previous task first, so two loops for the same
//! concern can never run side by side.
//!
//! Abort only lands at the task's next `.await`. Loops that mutate shared
//! state must also check an epoch under the lock; see `services::feed`.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawn `fut` on the runtime as a cancellable task.
    pub fn spawn<F>(name: &'static str, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self { name, handle: tokio::spawn(fut) }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the task. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Holder for the single live task of one concern.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Option<ScheduledTask>,
    cancelled: u64,
}

impl TaskSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `task`, cancelling whatever was there. Returns `true` if a
    /// live task was cancelled.
    pub fn replace(&mut self, task: ScheduledTask) -> bool {
        let cancelled = self.cancel();
        self.current = Some(task);
        cancelled
    }

    /// Cancel the current task, if any. Returns `true` if a live task was cancelled.
    pub fn cancel(&mut self) -> bool {
        let Some(task) = self.current.take() else {
            return false;
        };
        if task.is_finished() {
            return false;
        }
        task.cancel();
        self.cancelled += 1;
        debug!(task = task.name(), "scheduled task cancelled");
        true
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Number of live tasks this slot has cancelled.
    #[must_use]
    pub fn cancellations(&self) -> u64 {
        self.cancelled
    }
}
