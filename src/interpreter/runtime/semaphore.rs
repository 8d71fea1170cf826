use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Raised when a semaphore is released more times than it was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("semaphore released beyond its capacity of {capacity}")]
pub struct OverRelease {
    pub capacity: usize,
}

/// A counting semaphore with a fixed number of permits.
///
/// `acquire` blocks while no permit is free. `release` hands one back and
/// wakes a single waiter.
#[derive(Debug)]
pub struct Semaphore {
    capacity:  usize,
    available: Mutex<usize>,
    released:  Condvar,
}

impl Semaphore {
    /// Creates a semaphore with all `capacity` permits free.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity,
               available: Mutex::new(capacity),
               released: Condvar::new() }
    }

    /// Takes a permit, blocking until one is free.
    pub fn acquire(&self) {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
    }

    /// Returns a permit.
    ///
    /// ## Errors
    /// [`OverRelease`] if every permit is already free.
    pub fn release(&self) -> Result<(), OverRelease> {
        let mut available = self.available.lock();
        if *available >= self.capacity {
            return Err(OverRelease { capacity: self.capacity });
        }
        *available += 1;
        drop(available);
        self.released.notify_one();
        Ok(())
    }

    /// The number of permits currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.available.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;

    #[test]
    fn release_beyond_capacity_fails() {
        let sem = Semaphore::new(1);
        assert_eq!(sem.release(), Err(OverRelease { capacity: 1 }));
        sem.acquire();
        assert_eq!(sem.available(), 0);
        assert!(sem.release().is_ok());
    }

    #[test]
    fn acquire_blocks_until_release() {
        let sem = Arc::new(Semaphore::new(1));
        sem.acquire();

        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || {
                sem.acquire();
                sem.release().is_ok()
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        sem.release().unwrap();
        assert!(waiter.join().unwrap());
    }
}
