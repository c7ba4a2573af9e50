//! Digest queue and the deferred factory contract.
//!
//! # Toyota Way: Heijunka (平準化)
//! Work is levelled into a single FIFO queue and released only when the
//! test asks for it, so every run observes the same order.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::promise::Deferred;

/// A unit of deferred work: one continuation ready to run.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// FIFO queue of continuations shared by every promise of one scheduler.
///
/// Clones share the same underlying queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<VecDeque<Task>>>,
    executed: Arc<AtomicU64>,
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task to the back of the queue.
    pub fn schedule(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    /// Returns the number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Returns the number of tasks run over the queue's lifetime.
    #[must_use]
    pub fn total_executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Runs tasks until the queue is empty, including tasks enqueued by the
    /// tasks being run. Returns the number of tasks run by this call.
    ///
    /// The lock is released before each task runs, so tasks may freely
    /// schedule more work or settle other deferreds.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.tasks.lock().pop_front();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
            self.executed.fetch_add(1, Ordering::Relaxed);
        }
        ran
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .field("executed", &self.total_executed())
            .finish()
    }
}

/// Creates deferreds and flushes their continuations.
///
/// This is the seam between the stub engine and whatever promise machinery
/// the host provides. Implementations must never run a continuation from
/// inside `create`, `resolve` or `reject`; continuations run only from
/// [`DeferredFactory::drain_all`].
pub trait DeferredFactory: Send + Sync {
    /// Creates a pending deferred bound to this factory's queue.
    fn create(&self) -> Deferred;

    /// Runs every queued continuation to quiescence.
    ///
    /// Returns the number of continuations run.
    fn drain_all(&self) -> usize;

    /// Returns the number of continuations waiting for the next drain.
    fn pending_tasks(&self) -> usize;
}

/// Default deferred factory backed by a single digest queue.
///
/// Each test should own its scheduler; nothing here is global, so tests can
/// run in parallel without observing each other's continuations.
#[derive(Debug, Clone, Default)]
pub struct DigestScheduler {
    queue: TaskQueue,
    digests: Arc<AtomicU64>,
}

impl DigestScheduler {
    /// Creates a scheduler with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the queue backing this scheduler.
    #[must_use]
    pub const fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Returns how many digests have run.
    #[must_use]
    pub fn digest_count(&self) -> u64 {
        self.digests.load(Ordering::Relaxed)
    }
}

impl DeferredFactory for DigestScheduler {
    fn create(&self) -> Deferred {
        Deferred::with_queue(&self.queue)
    }

    fn drain_all(&self) -> usize {
        let digest = self.digests.fetch_add(1, Ordering::Relaxed) + 1;
        let ran = self.queue.drain();
        tracing::debug!(digest = digest, tasks = ran, "digest complete");
        ran
    }

    fn pending_tasks(&self) -> usize {
        self.queue.len()
    }
}
