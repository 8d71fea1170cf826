use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Misuse of a monitor by the calling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// `unlock` or `wait` was called while the monitor was not locked.
    #[error("monitor is not locked")]
    NotLocked,
}

#[derive(Debug, Default)]
struct State {
    locked:  bool,
    /// Tasks blocked in `wait`.
    waiting: usize,
    /// Wake-ups granted by `signal`/`broadcast` and not yet consumed.
    permits: usize,
}

/// A monitor: a lock plus a condition queue.
///
/// The lock is not tied to a thread, so a task may unlock a monitor another
/// task locked. `wait` atomically releases the lock, sleeps until signalled
/// and then reacquires the lock before returning.
#[derive(Debug, Default)]
pub struct Monitor {
    state:     Mutex<State>,
    lock_free: Condvar,
    signalled: Condvar,
}

impl Monitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock, blocking while another task holds it.
    pub fn lock(&self) {
        let mut state = self.state.lock();
        while state.locked {
            self.lock_free.wait(&mut state);
        }
        state.locked = true;
    }

    /// Releases the lock.
    ///
    /// ## Errors
    /// [`MonitorError::NotLocked`] if the monitor is not held.
    pub fn unlock(&self) -> Result<(), MonitorError> {
        let mut state = self.state.lock();
        if !state.locked {
            return Err(MonitorError::NotLocked);
        }
        state.locked = false;
        drop(state);
        self.lock_free.notify_one();
        Ok(())
    }

    /// Releases the lock, blocks until signalled, then reacquires the lock.
    ///
    /// ## Errors
    /// [`MonitorError::NotLocked`] if the monitor is not held.
    pub fn wait(&self) -> Result<(), MonitorError> {
        let mut state = self.state.lock();
        if !state.locked {
            return Err(MonitorError::NotLocked);
        }

        state.locked = false;
        state.waiting += 1;
        self.lock_free.notify_one();

        while state.permits == 0 {
            self.signalled.wait(&mut state);
        }
        state.permits -= 1;
        state.waiting -= 1;

        while state.locked {
            self.lock_free.wait(&mut state);
        }
        state.locked = true;
        Ok(())
    }

    /// Wakes one waiting task, if any.
    pub fn signal(&self) {
        let mut state = self.state.lock();
        if state.permits < state.waiting {
            state.permits += 1;
            drop(state);
            self.signalled.notify_one();
        }
    }

    /// Wakes every waiting task.
    pub fn broadcast(&self) {
        let mut state = self.state.lock();
        if state.permits < state.waiting {
            state.permits = state.waiting;
            drop(state);
            self.signalled.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::*;

    #[test]
    fn unlock_without_lock_fails() {
        let monitor = Monitor::new();
        assert_eq!(monitor.unlock(), Err(MonitorError::NotLocked));
        assert_eq!(monitor.wait(), Err(MonitorError::NotLocked));
    }

    #[test]
    fn signal_without_waiters_is_not_remembered() {
        let monitor = Arc::new(Monitor::new());
        monitor.signal();

        let ready = Arc::new(AtomicBool::new(false));
        let woke = Arc::new(AtomicBool::new(false));
        let waiter = {
            let (monitor, ready, woke) = (Arc::clone(&monitor), Arc::clone(&ready), Arc::clone(&woke));
            thread::spawn(move || {
                monitor.lock();
                ready.store(true, Ordering::SeqCst);
                monitor.wait().unwrap();
                woke.store(true, Ordering::SeqCst);
                monitor.unlock().unwrap();
            })
        };

        while !ready.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }
        monitor.lock();
        thread::sleep(Duration::from_millis(20));
        assert!(!woke.load(Ordering::SeqCst));

        monitor.signal();
        monitor.unlock().unwrap();
        waiter.join().unwrap();
        assert!(woke.load(Ordering::SeqCst));
    }

    #[test]
    fn broadcast_wakes_every_waiter() {
        let monitor = Arc::new(Monitor::new());
        let ready = Arc::new(Mutex::new(0));

        let waiters = (0..3).map(|_| {
                                let (monitor, ready) = (Arc::clone(&monitor), Arc::clone(&ready));
                                thread::spawn(move || {
                                    monitor.lock();
                                    *ready.lock() += 1;
                                    monitor.wait().unwrap();
                                    monitor.unlock().unwrap();
                                })
                            })
                            .collect::<Vec<_>>();

        while *ready.lock() < 3 {
            thread::sleep(Duration::from_millis(5));
        }

        monitor.lock();
        monitor.broadcast();
        monitor.unlock().unwrap();

        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
