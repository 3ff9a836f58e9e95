//! Countdown completion signal.
//!
//! The driver creates one [`CountdownLatch`] per trial with a count equal to
//! the number of spawned tasks. Each task holds a [`CompletionGuard`] for its
//! whole lifetime; the guard decrements the latch when dropped, which happens
//! on normal return, on early return with an error, and during unwinding.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::WaitCancelled;
use crate::interrupt::Interrupt;

/// Poll slice used by [`CountdownLatch::wait_interruptible`].
pub const WAIT_POLL: Duration = Duration::from_millis(5);

/// A one-shot countdown barrier.
#[derive(Debug)]
pub struct CountdownLatch {
    count: Mutex<usize>,
    zero: Condvar,
}

impl CountdownLatch {
    /// Create a latch that opens after `count` decrements.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Decrement the count, waking waiters when it reaches zero.
    /// Saturates at zero.
    pub fn count_down(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// Guard that calls [`count_down`](Self::count_down) exactly once, on drop.
    #[must_use = "the latch is decremented when the guard is dropped"]
    pub const fn guard(&self) -> CompletionGuard<'_> {
        CompletionGuard { latch: self }
    }

    /// Block until the count reaches zero.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.zero.wait(&mut count);
        }
    }

    /// Block until the count reaches zero or `timeout` elapses.
    ///
    /// Returns `true` if the latch opened.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.zero.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }

    /// Block until the count reaches zero, giving up once `interrupt` is raised.
    ///
    /// # Errors
    ///
    /// [`WaitCancelled`] with the remaining count if the interrupt was
    /// raised before the latch opened.
    pub fn wait_interruptible(&self, interrupt: &Interrupt) -> Result<(), WaitCancelled> {
        let mut count = self.count.lock();
        while *count > 0 {
            if interrupt.is_raised() {
                return Err(WaitCancelled {
                    outstanding: *count,
                });
            }
            let _ = self.zero.wait_for(&mut count, WAIT_POLL);
        }
        Ok(())
    }
}

/// Decrements its latch when dropped.
#[derive(Debug)]
pub struct CompletionGuard<'a> {
    latch: &'a CountdownLatch,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn opens_after_count_decrements() {
        let latch = CountdownLatch::new(2);
        latch.count_down();
        assert_eq!(latch.count(), 1);
        assert!(!latch.wait_timeout(Duration::from_millis(10)));

        latch.count_down();
        assert_eq!(latch.count(), 0);
        assert!(latch.wait_timeout(Duration::from_millis(10)));
        latch.wait();
    }

    #[test]
    fn count_down_saturates() {
        let latch = CountdownLatch::new(1);
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn guard_decrements_on_panic() {
        let latch = Arc::new(CountdownLatch::new(1));
        let worker = {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                let _done = latch.guard();
                panic!("task blew up");
            })
        };
        assert!(worker.join().is_err());
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn waiters_wake_from_other_threads() {
        let latch = Arc::new(CountdownLatch::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                thread::spawn(move || {
                    let _done = latch.guard();
                })
            })
            .collect();

        latch.wait();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(latch.count(), 0);
    }

    #[test]
    fn interruptible_wait_returns_cancelled() {
        let latch = CountdownLatch::new(1);
        let interrupt = Interrupt::new();
        interrupt.raise();
        assert_eq!(
            latch.wait_interruptible(&interrupt),
            Err(WaitCancelled { outstanding: 1 })
        );
        // latch untouched
        assert_eq!(latch.count(), 1);
    }

    #[test]
    fn interruptible_wait_succeeds_when_open() {
        let latch = CountdownLatch::new(0);
        let interrupt = Interrupt::new();
        interrupt.raise();
        assert_eq!(latch.wait_interruptible(&interrupt), Ok(()));
    }
}
