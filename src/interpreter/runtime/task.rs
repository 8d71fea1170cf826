use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

/// Counts the background tasks a program has to wait for before it exits.
///
/// Tasks started with [`TaskGroup::spawn`] are tracked until their closure
/// returns or unwinds. [`TaskGroup::wait`] blocks until none are running.
#[derive(Debug, Default)]
pub struct TaskGroup {
    active:   Mutex<usize>,
    idle:     Condvar,
    spawned:  AtomicUsize,
    failures: AtomicUsize,
}

/// Decrements the active count when a tracked task ends, including when it
/// panics.
struct TaskGuard {
    group: Arc<TaskGroup>,
    id:    usize,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        trace!(task = self.id, "task finished");
        let mut active = self.group.active.lock();
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.group.idle.notify_all();
        }
    }
}

impl TaskGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` on a new thread and tracks it until it finishes.
    ///
    /// ## Errors
    /// Returns the OS error if the thread could not be created; the task is
    /// not counted in that case.
    pub fn spawn<F>(self: &Arc<Self>, job: F) -> io::Result<()>
        where F: FnOnce() + Send + 'static
    {
        let id = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        *self.active.lock() += 1;

        let guard = TaskGuard { group: Arc::clone(self),
                                id };
        let spawned = thread::Builder::new().name(format!("r2-task-{id}"))
                                            .spawn(move || {
                                                let _guard = guard;
                                                trace!(task = id, "task started");
                                                job();
                                            });

        // A failed spawn drops the closure, and with it the guard.
        spawned.map(|_| ())
    }

    /// Runs `job` on a new thread that nobody waits for.
    ///
    /// ## Errors
    /// Returns the OS error if the thread could not be created.
    pub fn spawn_detached<F>(&self, job: F) -> io::Result<()>
        where F: FnOnce() + Send + 'static
    {
        let id = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        thread::Builder::new().name(format!("r2-detached-{id}"))
                              .spawn(move || {
                                  trace!(task = id, "detached task started");
                                  job();
                              })
                              .map(|_| ())
    }

    /// Blocks until every tracked task has finished.
    pub fn wait(&self) {
        let mut active = self.active.lock();
        while *active > 0 {
            self.idle.wait(&mut active);
        }
    }

    /// The number of tracked tasks still running.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    /// Notes that a task ended with an error.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// The number of tasks that ended with an error so far.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn wait_blocks_until_tracked_tasks_finish() {
        let group = Arc::new(TaskGroup::new());
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let done = Arc::clone(&done);
            group.spawn(move || {
                     thread::sleep(Duration::from_millis(10));
                     done.fetch_add(1, Ordering::SeqCst);
                 })
                 .unwrap();
        }

        group.wait();
        assert_eq!(done.load(Ordering::SeqCst), 4);
        assert_eq!(group.active(), 0);
    }

    #[test]
    fn panicking_task_still_counts_as_finished() {
        let group = Arc::new(TaskGroup::new());
        group.spawn(|| panic!("boom")).unwrap();
        group.wait();
        assert_eq!(group.active(), 0);
    }
}
